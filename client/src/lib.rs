//! # Basket Client
//!
//! The cart reconciliation store: a single cart for presentation code, kept
//! in browser storage while the shopper is anonymous and in the remote cart
//! service once they sign in.
//!
//! ```rust,no_run
//! use basket_client::{CartStore, HttpRemoteCart, MemoryStorage, SessionAuth, StoreConfig};
//! use basket_engine::{AddLine, ProductSnapshot};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StoreConfig::from_env()?;
//! let auth = Arc::new(SessionAuth::new());
//! let store = CartStore::new(
//!     Arc::new(HttpRemoteCart::new(config.api_url.clone())),
//!     MemoryStorage::new_shared(),
//!     auth.clone(),
//!     config,
//! );
//! let _watcher = store.spawn_watcher();
//!
//! store.load().await?;
//! let add = AddLine::new("iphone-17", 1).with_product(ProductSnapshot::new("iPhone 17", 799.0));
//! let view = store.add(add).await?;
//! assert_eq!(view.item_count, 1);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod remote;
pub mod storage;
pub mod store;

pub use auth::{AuthProvider, Session, SessionAuth};
pub use config::{ConfigError, StoreConfig};
pub use error::{RemoteError, Result, StorageError, StoreError};
pub use remote::{HttpRemoteCart, RemoteCartService};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageEvent};
pub use store::{CartState, CartStore};
