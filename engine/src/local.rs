//! Local cart - the anonymous, index-addressed line list.
//!
//! The local cart holds lines for a session without authentication. Lines
//! have no durable id, so they are addressed by position. Applying commands
//! is deterministic: the caller supplies the timestamp.

use crate::{
    command::{AddLine, Applied, CartCommand},
    error::Result,
    CartLine, CartView, Error, LineRef, Origin, Quantity, Timestamp,
};
use serde::{Deserialize, Serialize};

/// Ordered list of anonymous cart lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalCart {
    lines: Vec<CartLine>,
}

impl LocalCart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Create a cart from previously stored lines.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Get the line at `index`.
    pub fn get(&self, index: usize) -> Option<&CartLine> {
        self.lines.get(index)
    }

    /// Materialize the cart view.
    pub fn view(&self) -> CartView {
        CartView::from_local(&self.lines)
    }

    /// Apply a command to the cart.
    ///
    /// Quantity updates to zero or below remove the line.
    pub fn apply(&mut self, command: CartCommand, timestamp: Timestamp) -> Result<Applied> {
        match command.normalize() {
            CartCommand::Add(add) => self.apply_add(add, timestamp),
            CartCommand::UpdateQuantity { line, quantity } => {
                let index = Self::local_index(line)?;
                // normalize() leaves only positive quantities here
                let quantity = Quantity::try_from(quantity).unwrap_or(Quantity::MAX);
                self.apply_update(index, quantity)
            }
            CartCommand::Remove { line } => {
                let index = Self::local_index(line)?;
                self.apply_remove(index)
            }
            CartCommand::Clear => Ok(self.apply_clear()),
        }
    }

    fn apply_add(&mut self, add: AddLine, timestamp: Timestamp) -> Result<Applied> {
        if add.quantity == 0 {
            return Ok(Applied::Ignored);
        }

        let key = add.key();
        if let Some(index) = self.lines.iter().position(|l| l.matches(&key)) {
            let line = &mut self.lines[index];
            line.add_quantity(add.quantity);
            return Ok(Applied::Merged {
                index,
                quantity: line.quantity(),
            });
        }

        let unit_price = add
            .unit_price()
            .ok_or_else(|| Error::MissingProductSnapshot(add.product_id.clone()))?;

        self.lines.push(CartLine::new(
            key,
            add.quantity,
            unit_price,
            timestamp,
            add.display(),
        ));

        Ok(Applied::Appended {
            index: self.lines.len() - 1,
        })
    }

    fn apply_update(&mut self, index: usize, quantity: Quantity) -> Result<Applied> {
        let line = self
            .lines
            .get_mut(index)
            .ok_or(Error::LineNotFound(LineRef::Local(index)))?;

        line.set_quantity(quantity);

        Ok(Applied::Updated { index, quantity })
    }

    fn apply_remove(&mut self, index: usize) -> Result<Applied> {
        if index >= self.lines.len() {
            return Err(Error::LineNotFound(LineRef::Local(index)));
        }

        self.lines.remove(index);

        Ok(Applied::Removed { index })
    }

    fn apply_clear(&mut self) -> Applied {
        let removed = self.lines.len();
        self.lines.clear();
        Applied::Cleared { removed }
    }

    fn local_index(line: LineRef) -> Result<usize> {
        match line {
            LineRef::Local(index) => Ok(index),
            other => Err(Error::WrongLineRef {
                expected: Origin::Local.as_str(),
                got: other,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColorSnapshot, LineKey, ProductSnapshot, StorageSnapshot};

    fn add_iphone(quantity: Quantity) -> CartCommand {
        CartCommand::Add(
            AddLine::new("iphone-17", quantity).with_product(ProductSnapshot::new("iPhone 17", 799.0)),
        )
    }

    #[test]
    fn add_appends_new_line() {
        let mut cart = LocalCart::new();

        let result = cart.apply(add_iphone(1), 1000).unwrap();
        assert_eq!(result, Applied::Appended { index: 0 });

        let view = cart.view();
        assert_eq!(view.item_count, 1);
        assert_eq!(view.total, 799.0);
        assert_eq!(cart.get(0).unwrap().added_at(), 1000);
    }

    #[test]
    fn same_triple_merges() {
        let mut cart = LocalCart::new();
        cart.apply(add_iphone(1), 1000).unwrap();

        let result = cart.apply(add_iphone(2), 2000).unwrap();
        assert_eq!(
            result,
            Applied::Merged {
                index: 0,
                quantity: 3
            }
        );

        assert_eq!(cart.len(), 1);
        let line = cart.get(0).unwrap();
        assert_eq!(line.quantity(), 3);
        assert_eq!(line.total_price(), 2397.0);
        // merge keeps the original timestamp
        assert_eq!(line.added_at(), 1000);
    }

    #[test]
    fn different_variants_are_separate_lines() {
        let mut cart = LocalCart::new();
        let product = ProductSnapshot::new("iPhone 17", 799.0);

        let blue = AddLine::new("iphone-17", 1).with_product(product.clone()).with_color(
            1,
            ColorSnapshot {
                name: "Blue".into(),
                price_adjustment: 0.0,
            },
        );
        let large = AddLine::new("iphone-17", 1).with_product(product).with_storage(
            2,
            StorageSnapshot {
                label: "512 GB".into(),
                price: 200.0,
            },
        );

        cart.apply(CartCommand::Add(blue), 1).unwrap();
        cart.apply(CartCommand::Add(large), 2).unwrap();

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.get(1).unwrap().key(), &LineKey::new("iphone-17", None, Some(2)));
        assert_eq!(cart.view().total, 1798.0);
    }

    #[test]
    fn add_requires_product_snapshot_for_new_line() {
        let mut cart = LocalCart::new();
        let err = cart
            .apply(CartCommand::Add(AddLine::new("airpods-4", 1)), 1)
            .unwrap_err();
        assert_eq!(err, Error::MissingProductSnapshot("airpods-4".into()));
        assert!(cart.is_empty());
    }

    #[test]
    fn merge_does_not_need_snapshot() {
        let mut cart = LocalCart::new();
        cart.apply(add_iphone(1), 1).unwrap();
        cart.apply(CartCommand::Add(AddLine::new("iphone-17", 1)), 2).unwrap();
        assert_eq!(cart.get(0).unwrap().quantity(), 2);
    }

    #[test]
    fn zero_quantity_add_is_ignored() {
        let mut cart = LocalCart::new();
        assert_eq!(cart.apply(add_iphone(0), 1).unwrap(), Applied::Ignored);
        assert!(cart.is_empty());
    }

    #[test]
    fn update_quantity_recomputes_total() {
        let mut cart = LocalCart::new();
        cart.apply(add_iphone(1), 1).unwrap();

        cart.apply(
            CartCommand::UpdateQuantity {
                line: LineRef::Local(0),
                quantity: 3,
            },
            2,
        )
        .unwrap();

        assert_eq!(cart.view().total, 2397.0);
        assert_eq!(cart.view().item_count, 3);
    }

    #[test]
    fn non_positive_update_removes() {
        for quantity in [0, -1] {
            let mut cart = LocalCart::new();
            cart.apply(add_iphone(2), 1).unwrap();

            let result = cart
                .apply(
                    CartCommand::UpdateQuantity {
                        line: LineRef::Local(0),
                        quantity,
                    },
                    2,
                )
                .unwrap();

            assert_eq!(result, Applied::Removed { index: 0 });
            assert!(cart.is_empty());
        }
    }

    #[test]
    fn out_of_range_index() {
        let mut cart = LocalCart::new();
        cart.apply(add_iphone(1), 1).unwrap();

        let err = cart
            .apply(
                CartCommand::Remove {
                    line: LineRef::Local(5),
                },
                2,
            )
            .unwrap_err();
        assert_eq!(err, Error::LineNotFound(LineRef::Local(5)));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn remote_ref_rejected() {
        let mut cart = LocalCart::new();
        cart.apply(add_iphone(1), 1).unwrap();

        let err = cart
            .apply(
                CartCommand::Remove {
                    line: LineRef::Remote(1),
                },
                2,
            )
            .unwrap_err();
        assert!(matches!(err, Error::WrongLineRef { expected: "local", .. }));
    }

    #[test]
    fn remove_shifts_indices() {
        let mut cart = LocalCart::new();
        cart.apply(add_iphone(1), 1).unwrap();
        cart.apply(
            CartCommand::Add(
                AddLine::new("airpods-4", 1).with_product(ProductSnapshot::new("AirPods 4", 129.0)),
            ),
            2,
        )
        .unwrap();

        cart.apply(
            CartCommand::Remove {
                line: LineRef::Local(0),
            },
            3,
        )
        .unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(0).unwrap().product_id(), "airpods-4");
    }

    #[test]
    fn clear_empties_cart() {
        let mut cart = LocalCart::new();
        cart.apply(add_iphone(1), 1).unwrap();

        assert_eq!(
            cart.apply(CartCommand::Clear, 2).unwrap(),
            Applied::Cleared { removed: 1 }
        );
        assert!(cart.is_empty());
        assert_eq!(cart.view().total, 0.0);
    }
}
