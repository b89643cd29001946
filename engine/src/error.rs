//! Error types for the Basket engine.

use crate::{LineRef, ProductId};
use thiserror::Error;

/// All possible errors from the Basket engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Addressing errors
    #[error("cart line not found: {0}")]
    LineNotFound(LineRef),

    #[error("line reference {got} does not address the {expected} cart")]
    WrongLineRef { expected: &'static str, got: LineRef },

    // Pricing errors
    #[error("missing product snapshot for {0}: unit price cannot be computed")]
    MissingProductSnapshot(ProductId),

    // Encoding errors
    #[error("failed to encode cart lines: {0}")]
    Encode(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::LineNotFound(LineRef::Local(3));
        assert_eq!(err.to_string(), "cart line not found: local#3");

        let err = Error::WrongLineRef {
            expected: "local",
            got: LineRef::Remote(42),
        };
        assert_eq!(
            err.to_string(),
            "line reference remote#42 does not address the local cart"
        );

        let err = Error::MissingProductSnapshot("iphone-17".into());
        assert_eq!(
            err.to_string(),
            "missing product snapshot for iphone-17: unit price cannot be computed"
        );
    }
}
