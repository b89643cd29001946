//! The materialized cart view.

use crate::{CartLine, LineRef, Origin, Price, RemoteCartLine};
use serde::{Deserialize, Serialize};

/// A line together with the reference that addresses it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub line_ref: LineRef,
    pub line: CartLine,
}

/// The cart as presented to callers.
///
/// Totals are recomputed every time a view is built and are never stored.
/// A view is built from exactly one cart set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub source: Origin,
    pub entries: Vec<CartEntry>,
    pub total: Price,
    pub item_count: u64,
}

impl CartView {
    /// An empty view of the given set.
    pub fn empty(source: Origin) -> Self {
        Self {
            source,
            entries: Vec::new(),
            total: 0.0,
            item_count: 0,
        }
    }

    /// Build a view of local lines, addressed by index.
    pub fn from_local(lines: &[CartLine]) -> Self {
        let entries = lines
            .iter()
            .enumerate()
            .map(|(index, line)| CartEntry {
                line_ref: LineRef::Local(index),
                line: line.clone(),
            })
            .collect();
        Self::from_entries(Origin::Local, entries)
    }

    /// Build a view of remote lines, addressed by id.
    pub fn from_remote(lines: &[RemoteCartLine]) -> Self {
        let entries = lines
            .iter()
            .map(|remote| CartEntry {
                line_ref: remote.line_ref(),
                line: remote.line.clone(),
            })
            .collect();
        Self::from_entries(Origin::Remote, entries)
    }

    fn from_entries(source: Origin, entries: Vec<CartEntry>) -> Self {
        let total = entries.iter().map(|e| e.line.total_price()).sum();
        let item_count = entries
            .iter()
            .map(|e| u64::from(e.line.quantity()))
            .sum();
        Self {
            source,
            entries,
            total,
            item_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Find the entry addressed by `line_ref`.
    pub fn entry(&self, line_ref: LineRef) -> Option<&CartEntry> {
        self.entries.iter().find(|e| e.line_ref == line_ref)
    }

    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.entries.iter().map(|e| &e.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LineDisplay, LineKey};

    fn line(product: &str, quantity: u32, price: Price) -> CartLine {
        CartLine::new(
            LineKey::product(product),
            quantity,
            price,
            0,
            LineDisplay::default(),
        )
    }

    #[test]
    fn local_view_totals() {
        let view = CartView::from_local(&[line("iphone-17", 3, 799.0), line("airpods-4", 1, 129.0)]);

        assert_eq!(view.source, Origin::Local);
        assert_eq!(view.total, 2526.0);
        assert_eq!(view.item_count, 4);
        assert_eq!(view.entries[1].line_ref, LineRef::Local(1));
    }

    #[test]
    fn remote_view_uses_ids() {
        let view = CartView::from_remote(&[
            RemoteCartLine::new(10, line("macbook-pro", 1, 1999.0)),
            RemoteCartLine::new(12, line("magic-mouse", 1, 500.0)),
        ]);

        assert_eq!(view.source, Origin::Remote);
        assert_eq!(view.total, 2499.0);
        assert!(view.entry(LineRef::Remote(12)).is_some());
        assert!(view.entry(LineRef::Local(0)).is_none());
    }

    #[test]
    fn empty_view() {
        let view = CartView::empty(Origin::Remote);
        assert!(view.is_empty());
        assert_eq!(view.total, 0.0);
        assert_eq!(view.item_count, 0);
    }
}
