//! Cart line types and pricing.

use crate::{LineId, Price, ProductId, Quantity, Timestamp, VariantId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which cart set a line or view belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Anonymous cart kept in browser storage
    Local,
    /// Authenticated cart kept by the remote cart service
    Remote,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Local => "local",
            Origin::Remote => "remote",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a single line in the active cart.
///
/// Remote lines are addressed by their durable service id, local lines by
/// their position in the stored list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum LineRef {
    Remote(LineId),
    Local(usize),
}

impl LineRef {
    /// The cart set this reference can address.
    pub fn origin(&self) -> Origin {
        match self {
            LineRef::Remote(_) => Origin::Remote,
            LineRef::Local(_) => Origin::Local,
        }
    }
}

impl fmt::Display for LineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineRef::Remote(id) => write!(f, "remote#{id}"),
            LineRef::Local(index) => write!(f, "local#{index}"),
        }
    }
}

/// Product fields known to the caller when adding to the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    /// Base price before variant surcharges
    pub price: Price,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
}

impl ProductSnapshot {
    pub fn new(name: impl Into<String>, price: Price) -> Self {
        Self {
            price,
            name: name.into(),
            image: None,
            tagline: None,
        }
    }
}

/// Chosen color variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorSnapshot {
    pub name: String,
    #[serde(default)]
    pub price_adjustment: Price,
}

/// Chosen storage variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSnapshot {
    pub label: String,
    /// Surcharge on top of the product's base price
    #[serde(default)]
    pub price: Price,
}

/// Compute a line's unit price from the product and its variant surcharges.
pub fn unit_price(
    product: &ProductSnapshot,
    color: Option<&ColorSnapshot>,
    storage: Option<&StorageSnapshot>,
) -> Price {
    product.price
        + storage.map(|s| s.price).unwrap_or(0.0)
        + color.map(|c| c.price_adjustment).unwrap_or(0.0)
}

/// The `(product, color, storage)` triple identifying a purchasable configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineKey {
    pub product_id: ProductId,
    #[serde(default)]
    pub color_id: Option<VariantId>,
    #[serde(default)]
    pub storage_id: Option<VariantId>,
}

impl LineKey {
    pub fn new(
        product_id: impl Into<ProductId>,
        color_id: Option<VariantId>,
        storage_id: Option<VariantId>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            color_id,
            storage_id,
        }
    }

    /// Key for a product with no variant selection.
    pub fn product(product_id: impl Into<ProductId>) -> Self {
        Self::new(product_id, None, None)
    }
}

/// Display fields copied into a line when it is added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDisplay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_label: Option<String>,
}

impl LineDisplay {
    /// Capture whatever display fields the snapshots provide.
    pub fn capture(
        product: Option<&ProductSnapshot>,
        color: Option<&ColorSnapshot>,
        storage: Option<&StorageSnapshot>,
    ) -> Self {
        Self {
            product_name: product.map(|p| p.name.clone()),
            product_image: product.and_then(|p| p.image.clone()),
            product_tagline: product.and_then(|p| p.tagline.clone()),
            color_name: color.map(|c| c.name.clone()),
            storage_label: storage.map(|s| s.label.clone()),
        }
    }
}

/// Serialized shape of a [`CartLine`].
///
/// Deserialization goes through this type so that `totalPrice` is always
/// recomputed from `unitPrice * quantity`, whatever the stored value says.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartLineRepr {
    product_id: ProductId,
    #[serde(default)]
    color_id: Option<VariantId>,
    #[serde(default)]
    storage_id: Option<VariantId>,
    quantity: Quantity,
    unit_price: Price,
    #[serde(default)]
    total_price: Price,
    #[serde(default)]
    added_at: Timestamp,
    #[serde(default)]
    display: LineDisplay,
}

/// One product configuration in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CartLineRepr", into = "CartLineRepr")]
pub struct CartLine {
    key: LineKey,
    quantity: Quantity,
    unit_price: Price,
    total_price: Price,
    added_at: Timestamp,
    display: LineDisplay,
}

impl From<CartLineRepr> for CartLine {
    fn from(repr: CartLineRepr) -> Self {
        CartLine::new(
            LineKey::new(repr.product_id, repr.color_id, repr.storage_id),
            repr.quantity,
            repr.unit_price,
            repr.added_at,
            repr.display,
        )
    }
}

impl From<CartLine> for CartLineRepr {
    fn from(line: CartLine) -> Self {
        CartLineRepr {
            product_id: line.key.product_id,
            color_id: line.key.color_id,
            storage_id: line.key.storage_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            total_price: line.total_price,
            added_at: line.added_at,
            display: line.display,
        }
    }
}

impl CartLine {
    /// Create a new line. The total is derived from price and quantity.
    pub fn new(
        key: LineKey,
        quantity: Quantity,
        unit_price: Price,
        added_at: Timestamp,
        display: LineDisplay,
    ) -> Self {
        Self {
            key,
            quantity,
            unit_price,
            total_price: unit_price * f64::from(quantity),
            added_at,
            display,
        }
    }

    pub fn key(&self) -> &LineKey {
        &self.key
    }

    pub fn product_id(&self) -> &ProductId {
        &self.key.product_id
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn unit_price(&self) -> Price {
        self.unit_price
    }

    pub fn total_price(&self) -> Price {
        self.total_price
    }

    /// When the line was first added (milliseconds since epoch).
    pub fn added_at(&self) -> Timestamp {
        self.added_at
    }

    pub fn display(&self) -> &LineDisplay {
        &self.display
    }

    /// Check whether this line holds the given configuration.
    pub fn matches(&self, key: &LineKey) -> bool {
        self.key == *key
    }

    /// Set the quantity and recompute the total.
    pub fn set_quantity(&mut self, quantity: Quantity) {
        self.quantity = quantity;
        self.total_price = self.unit_price * f64::from(quantity);
    }

    /// Increase the quantity and recompute the total.
    pub fn add_quantity(&mut self, quantity: Quantity) {
        self.set_quantity(self.quantity.saturating_add(quantity));
    }
}

/// A line held by the remote cart service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartLine {
    /// Durable id assigned by the service
    pub id: LineId,
    #[serde(flatten)]
    pub line: CartLine,
}

impl RemoteCartLine {
    pub fn new(id: LineId, line: CartLine) -> Self {
        Self { id, line }
    }

    pub fn line_ref(&self) -> LineRef {
        LineRef::Remote(self.id)
    }
}
