//! Encoding of the local cart blob kept in browser storage.
//!
//! The blob is a plain JSON array of lines stored under [`LOCAL_CART_KEY`].
//! Decoding never fails: a missing or unparseable blob is an empty cart, and
//! entries that cannot be read are skipped.

use crate::{error::Result, CartLine, Error, LocalCart};
use serde_json::Value;

/// Storage key holding the local cart.
pub const LOCAL_CART_KEY: &str = "cart";

/// Keys written by earlier cart formats. They are purged on every load and
/// never read.
pub const LEGACY_CART_KEYS: &[&str] = &["cartItems"];

/// Result of decoding a stored blob.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedCart {
    pub cart: LocalCart,
    /// The blob was present but was not a JSON array
    pub malformed: bool,
    /// Entries dropped because they could not be read or had zero quantity
    pub skipped: usize,
    /// Entries folded into an earlier line with the same triple
    pub merged: usize,
}

/// Encode lines for storage.
pub fn encode_lines(lines: &[CartLine]) -> Result<String> {
    serde_json::to_string(lines).map_err(|e| Error::Encode(e.to_string()))
}

/// Decode a stored blob.
pub fn decode_lines(raw: Option<&str>) -> DecodedCart {
    let Some(raw) = raw else {
        return DecodedCart::default();
    };

    let entries = match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(entries) => entries,
        Err(_) => {
            return DecodedCart {
                malformed: true,
                ..DecodedCart::default()
            }
        }
    };

    let mut lines: Vec<CartLine> = Vec::with_capacity(entries.len());
    let mut skipped = 0;
    let mut merged = 0;

    for entry in entries {
        let line = match serde_json::from_value::<CartLine>(entry) {
            Ok(line) if line.quantity() > 0 => line,
            _ => {
                skipped += 1;
                continue;
            }
        };

        // Two writers racing on the same blob can leave duplicate triples.
        match lines.iter_mut().find(|l| l.matches(line.key())) {
            Some(existing) => {
                existing.add_quantity(line.quantity());
                merged += 1;
            }
            None => lines.push(line),
        }
    }

    DecodedCart {
        cart: LocalCart::from_lines(lines),
        malformed: false,
        skipped,
        merged,
    }
}
