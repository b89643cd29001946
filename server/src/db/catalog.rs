//! Product catalog used to price incoming lines.

use basket_engine::{
    unit_price, ColorSnapshot, LineDisplay, Price, ProductId, ProductSnapshot, StorageSnapshot,
    VariantId,
};

use crate::error::AppError;

/// A product with its purchasable variants.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub snapshot: ProductSnapshot,
    pub colors: Vec<(VariantId, ColorSnapshot)>,
    pub storage: Vec<(VariantId, StorageSnapshot)>,
}

/// Price and display fields for one configuration of a product.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub unit_price: Price,
    pub display: LineDisplay,
}

impl CatalogProduct {
    pub fn new(id: impl Into<ProductId>, snapshot: ProductSnapshot) -> Self {
        Self {
            id: id.into(),
            snapshot,
            colors: Vec::new(),
            storage: Vec::new(),
        }
    }

    pub fn with_color(mut self, id: VariantId, name: &str, price_adjustment: Price) -> Self {
        self.colors.push((
            id,
            ColorSnapshot {
                name: name.to_string(),
                price_adjustment,
            },
        ));
        self
    }

    pub fn with_storage(mut self, id: VariantId, label: &str, price: Price) -> Self {
        self.storage.push((
            id,
            StorageSnapshot {
                label: label.to_string(),
                price,
            },
        ));
        self
    }

    fn color(&self, id: VariantId) -> Option<&ColorSnapshot> {
        self.colors.iter().find(|(c, _)| *c == id).map(|(_, c)| c)
    }

    fn storage_option(&self, id: VariantId) -> Option<&StorageSnapshot> {
        self.storage.iter().find(|(s, _)| *s == id).map(|(_, s)| s)
    }

    /// Price a configuration. Unknown variant ids are rejected.
    pub fn quote(
        &self,
        color_id: Option<VariantId>,
        storage_id: Option<VariantId>,
    ) -> Result<Quote, AppError> {
        let color = color_id
            .map(|id| {
                self.color(id).ok_or_else(|| {
                    AppError::BadRequest(format!("Unknown color {} for {}", id, self.id))
                })
            })
            .transpose()?;
        let storage = storage_id
            .map(|id| {
                self.storage_option(id).ok_or_else(|| {
                    AppError::BadRequest(format!("Unknown storage option {} for {}", id, self.id))
                })
            })
            .transpose()?;

        Ok(Quote {
            unit_price: unit_price(&self.snapshot, color, storage),
            display: LineDisplay::capture(Some(&self.snapshot), color, storage),
        })
    }
}

/// Small catalog served when no database is configured.
pub fn demo_catalog() -> Vec<CatalogProduct> {
    let mut iphone = ProductSnapshot::new("iPhone 17", 799.0);
    iphone.tagline = Some("Magichromatic.".to_string());
    iphone.image = Some("/images/iphone-17.png".to_string());

    let mut watch = ProductSnapshot::new("Watch Series 11", 399.0);
    watch.image = Some("/images/watch-11.png".to_string());

    let mut earbuds = ProductSnapshot::new("AirPods Pro 3", 249.0);
    earbuds.tagline = Some("Hear the difference.".to_string());

    vec![
        CatalogProduct::new("iphone-17", iphone)
            .with_color(1, "Lavender", 0.0)
            .with_color(2, "Sage", 0.0)
            .with_color(3, "Cosmic Orange", 50.0)
            .with_storage(1, "256GB", 0.0)
            .with_storage(2, "512GB", 200.0),
        CatalogProduct::new("watch-11", watch)
            .with_color(1, "Midnight", 0.0)
            .with_color(2, "Silver", 0.0),
        CatalogProduct::new("airpods-pro-3", earbuds),
    ]
}
