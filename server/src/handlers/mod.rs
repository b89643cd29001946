//! Request handlers for cart operations.

mod cart;

pub use cart::*;
