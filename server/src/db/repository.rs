//! Storage abstraction for authenticated carts.

use async_trait::async_trait;
use basket_engine::{LineId, LineKey, Quantity, RemoteCartLine, Timestamp};

use super::{CatalogProduct, Quote};
use crate::error::Result;

/// Persistence for catalog lookups and per-owner cart lines.
///
/// Implementations merge lines by `(product, color, storage)` on insert so an
/// owner never has two lines for the same configuration.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Look up a product and its variants.
    async fn find_product(&self, product_id: &str) -> Result<Option<CatalogProduct>>;

    /// All lines of an owner, oldest first.
    async fn list_lines(&self, owner: &str) -> Result<Vec<RemoteCartLine>>;

    /// Insert a line, or add `quantity` to the owner's line with the same key.
    async fn add_line(
        &self,
        owner: &str,
        key: &LineKey,
        quantity: Quantity,
        quote: &Quote,
        added_at: Timestamp,
    ) -> Result<RemoteCartLine>;

    /// Set a line's quantity. Returns `false` when the owner has no such line.
    async fn update_quantity(&self, owner: &str, id: LineId, quantity: Quantity) -> Result<bool>;

    /// Delete a line. Returns `false` when the owner has no such line.
    async fn remove_line(&self, owner: &str, id: LineId) -> Result<bool>;

    /// Delete every line of an owner, returning how many were removed.
    async fn clear(&self, owner: &str) -> Result<u64>;
}
