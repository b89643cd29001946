//! # Basket Engine
//!
//! The deterministic core of the Basket cart.
//!
//! This crate holds the cart's data model and every rule that does not need
//! IO: pricing, merging lines by configuration, index-addressed local
//! mutations, the stored blob format and migration planning. The async store
//! in `basket-client` drives it against browser storage and the remote cart
//! service.
//!
//! ## Design Principles
//!
//! - **No IO**: timestamps are passed in, storage and network live elsewhere
//! - **Derived totals**: a line's total is always `unit price * quantity`
//! - **One set at a time**: a [`CartView`] is built from local or remote lines, never both
//!
//! ## Core Concepts
//!
//! ### Lines
//!
//! A [`CartLine`] is one product configuration, identified by its [`LineKey`]
//! triple `(product, color, storage)`. Remote lines ([`RemoteCartLine`]) carry
//! a durable id; local lines are addressed by position. A [`LineRef`] names
//! either kind.
//!
//! ### Commands
//!
//! Mutations are [`CartCommand`]s. [`LocalCart::apply`] executes them against
//! the local list; the remote path turns them into service requests.
//!
//! ### Migration
//!
//! [`CartMode`] selects the active set from session and pending-local state.
//! [`MigrationPlan`] replays local lines as remote adds on sign-in.
//!
//! ## Quick Start
//!
//! ```rust
//! use basket_engine::{AddLine, CartCommand, LineRef, LocalCart, ProductSnapshot};
//!
//! let mut cart = LocalCart::new();
//!
//! let add = AddLine::new("iphone-17", 1).with_product(ProductSnapshot::new("iPhone 17", 799.0));
//! cart.apply(CartCommand::Add(add), 1760000000000).unwrap();
//!
//! cart.apply(
//!     CartCommand::UpdateQuantity { line: LineRef::Local(0), quantity: 3 },
//!     1760000001000,
//! )
//! .unwrap();
//!
//! let view = cart.view();
//! assert_eq!(view.item_count, 3);
//! assert_eq!(view.total, 2397.0);
//! ```

pub mod cart;
pub mod command;
pub mod error;
pub mod line;
pub mod local;
pub mod migration;
pub mod remote;
pub mod snapshot;

// Re-export main types at crate root
pub use cart::{CartEntry, CartView};
pub use command::{AddLine, Applied, CartCommand};
pub use error::Error;
pub use line::{
    unit_price, CartLine, ColorSnapshot, LineDisplay, LineKey, LineRef, Origin, ProductSnapshot,
    RemoteCartLine, StorageSnapshot,
};
pub use local::LocalCart;
pub use migration::{CartMode, MigrationOutcome, MigrationPlan, MigrationProgress};
pub use remote::{AddLineRequest, ErrorBody, LinesResponse, UpdateQuantityRequest};
pub use snapshot::{decode_lines, encode_lines, DecodedCart, LEGACY_CART_KEYS, LOCAL_CART_KEY};

/// Type aliases for clarity
pub type ProductId = String;
pub type LineId = i64;
pub type VariantId = i32;
pub type Quantity = u32;
pub type Price = f64;
pub type Timestamp = u64;
