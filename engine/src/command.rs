//! Cart commands.
//!
//! Every store mutation is expressed as a command. The local cart applies
//! commands directly; the remote path translates them into service calls.

use crate::{
    line::{unit_price, ColorSnapshot, LineDisplay, LineKey, ProductSnapshot, StorageSnapshot},
    remote::AddLineRequest,
    LineRef, Price, ProductId, Quantity, VariantId,
};
use serde::{Deserialize, Serialize};

/// Request to add a product configuration to the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLine {
    pub product_id: ProductId,
    pub quantity: Quantity,
    #[serde(default)]
    pub color_id: Option<VariantId>,
    #[serde(default)]
    pub storage_id: Option<VariantId>,
    #[serde(default)]
    pub product: Option<ProductSnapshot>,
    #[serde(default)]
    pub color: Option<ColorSnapshot>,
    #[serde(default)]
    pub storage: Option<StorageSnapshot>,
}

impl AddLine {
    /// Add `quantity` of a product with no variant selection.
    pub fn new(product_id: impl Into<ProductId>, quantity: Quantity) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            color_id: None,
            storage_id: None,
            product: None,
            color: None,
            storage: None,
        }
    }

    pub fn with_product(mut self, product: ProductSnapshot) -> Self {
        self.product = Some(product);
        self
    }

    pub fn with_color(mut self, color_id: VariantId, color: ColorSnapshot) -> Self {
        self.color_id = Some(color_id);
        self.color = Some(color);
        self
    }

    pub fn with_storage(mut self, storage_id: VariantId, storage: StorageSnapshot) -> Self {
        self.storage_id = Some(storage_id);
        self.storage = Some(storage);
        self
    }

    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id.clone(), self.color_id, self.storage_id)
    }

    /// Unit price from the snapshots, if a product snapshot is present.
    pub fn unit_price(&self) -> Option<Price> {
        self.product
            .as_ref()
            .map(|p| unit_price(p, self.color.as_ref(), self.storage.as_ref()))
    }

    pub fn display(&self) -> LineDisplay {
        LineDisplay::capture(
            self.product.as_ref(),
            self.color.as_ref(),
            self.storage.as_ref(),
        )
    }

    /// The remote form of this request. Prices are not sent; the service
    /// computes them.
    pub fn to_request(&self) -> AddLineRequest {
        AddLineRequest {
            product_id: self.product_id.clone(),
            quantity: self.quantity,
            color_id: self.color_id,
            storage_id: self.storage_id,
        }
    }
}

/// A mutation of the active cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CartCommand {
    Add(AddLine),
    UpdateQuantity { line: LineRef, quantity: i64 },
    Remove { line: LineRef },
    Clear,
}

impl CartCommand {
    /// Normalize the command: quantity updates to zero or below become removals.
    pub fn normalize(self) -> Self {
        match self {
            CartCommand::UpdateQuantity { line, quantity } if quantity <= 0 => {
                CartCommand::Remove { line }
            }
            other => other,
        }
    }

    /// The line this command targets, if it targets a single line.
    pub fn line_ref(&self) -> Option<LineRef> {
        match self {
            CartCommand::UpdateQuantity { line, .. } | CartCommand::Remove { line } => Some(*line),
            CartCommand::Add(_) | CartCommand::Clear => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CartCommand::Add(_) => "add",
            CartCommand::UpdateQuantity { .. } => "update_quantity",
            CartCommand::Remove { .. } => "remove",
            CartCommand::Clear => "clear",
        }
    }
}

/// Outcome of applying a command to the local cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum Applied {
    /// A new line was appended at `index`
    Appended { index: usize },
    /// An existing line with the same triple absorbed the quantity
    Merged { index: usize, quantity: Quantity },
    /// The line at `index` now has `quantity`
    Updated { index: usize, quantity: Quantity },
    Removed { index: usize },
    Cleared { removed: usize },
    /// The command had nothing to do
    Ignored,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_update_becomes_remove() {
        let cmd = CartCommand::UpdateQuantity {
            line: LineRef::Local(1),
            quantity: 0,
        };
        assert_eq!(
            cmd.normalize(),
            CartCommand::Remove {
                line: LineRef::Local(1)
            }
        );

        let cmd = CartCommand::UpdateQuantity {
            line: LineRef::Remote(5),
            quantity: -1,
        };
        assert_eq!(
            cmd.normalize(),
            CartCommand::Remove {
                line: LineRef::Remote(5)
            }
        );

        let cmd = CartCommand::UpdateQuantity {
            line: LineRef::Remote(5),
            quantity: 2,
        };
        assert_eq!(cmd.clone().normalize(), cmd);
    }

    #[test]
    fn add_line_pricing_and_request() {
        let add = AddLine::new("ipad-pro", 2)
            .with_product(ProductSnapshot::new("iPad Pro", 999.0))
            .with_color(
                3,
                ColorSnapshot {
                    name: "Silver".into(),
                    price_adjustment: 0.0,
                },
            )
            .with_storage(
                1,
                StorageSnapshot {
                    label: "1 TB".into(),
                    price: 600.0,
                },
            );

        assert_eq!(add.unit_price(), Some(1599.0));
        assert_eq!(add.key(), LineKey::new("ipad-pro", Some(3), Some(1)));

        let request = add.to_request();
        assert_eq!(request.product_id, "ipad-pro");
        assert_eq!(request.quantity, 2);
        assert_eq!(request.color_id, Some(3));
        assert_eq!(request.storage_id, Some(1));
    }

    #[test]
    fn add_without_product_has_no_price() {
        assert_eq!(AddLine::new("airpods", 1).unit_price(), None);
    }

    #[test]
    fn command_line_ref() {
        assert_eq!(CartCommand::Clear.line_ref(), None);
        assert_eq!(
            CartCommand::Remove {
                line: LineRef::Local(4)
            }
            .line_ref(),
            Some(LineRef::Local(4))
        );
    }
}
