//! Cart persistence.

mod catalog;
mod memory;
mod pool;
mod postgres;
mod repository;

pub use catalog::*;
pub use memory::*;
pub use pool::*;
pub use postgres::*;
pub use repository::*;
