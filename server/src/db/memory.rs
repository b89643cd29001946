//! In-memory repository used when no database is configured.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use basket_engine::{CartLine, LineId, LineKey, Quantity, RemoteCartLine, Timestamp};
use dashmap::DashMap;

use super::{demo_catalog, CartRepository, CatalogProduct, Quote};
use crate::error::Result;

/// Volatile cart storage keyed by owner.
pub struct MemoryCartRepository {
    catalog: DashMap<String, CatalogProduct>,
    carts: DashMap<String, Vec<RemoteCartLine>>,
    next_id: AtomicI64,
}

impl MemoryCartRepository {
    /// An empty repository with no products.
    pub fn new() -> Self {
        Self {
            catalog: DashMap::new(),
            carts: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// A repository seeded with [`demo_catalog`].
    pub fn with_demo_catalog() -> Self {
        let repo = Self::new();
        for product in demo_catalog() {
            repo.insert_product(product);
        }
        repo
    }

    pub fn insert_product(&self, product: CatalogProduct) {
        self.catalog.insert(product.id.clone(), product);
    }
}

impl Default for MemoryCartRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CartRepository for MemoryCartRepository {
    async fn find_product(&self, product_id: &str) -> Result<Option<CatalogProduct>> {
        Ok(self.catalog.get(product_id).map(|p| p.value().clone()))
    }

    async fn list_lines(&self, owner: &str) -> Result<Vec<RemoteCartLine>> {
        Ok(self
            .carts
            .get(owner)
            .map(|lines| lines.value().clone())
            .unwrap_or_default())
    }

    async fn add_line(
        &self,
        owner: &str,
        key: &LineKey,
        quantity: Quantity,
        quote: &Quote,
        added_at: Timestamp,
    ) -> Result<RemoteCartLine> {
        let mut lines = self.carts.entry(owner.to_string()).or_default();

        if let Some(existing) = lines.iter_mut().find(|l| l.line.matches(key)) {
            existing.line.add_quantity(quantity);
            return Ok(existing.clone());
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let line = RemoteCartLine::new(
            id,
            CartLine::new(
                key.clone(),
                quantity,
                quote.unit_price,
                added_at,
                quote.display.clone(),
            ),
        );
        lines.push(line.clone());
        Ok(line)
    }

    async fn update_quantity(&self, owner: &str, id: LineId, quantity: Quantity) -> Result<bool> {
        let Some(mut lines) = self.carts.get_mut(owner) else {
            return Ok(false);
        };
        match lines.iter_mut().find(|l| l.id == id) {
            Some(line) => {
                line.line.set_quantity(quantity);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_line(&self, owner: &str, id: LineId) -> Result<bool> {
        let Some(mut lines) = self.carts.get_mut(owner) else {
            return Ok(false);
        };
        let before = lines.len();
        lines.retain(|l| l.id != id);
        Ok(lines.len() < before)
    }

    async fn clear(&self, owner: &str) -> Result<u64> {
        Ok(self
            .carts
            .remove(owner)
            .map(|(_, lines)| lines.len() as u64)
            .unwrap_or(0))
    }
}
