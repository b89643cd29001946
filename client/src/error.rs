//! Error types for the cart store.

use thiserror::Error;

/// Failures talking to the remote cart service.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote cart service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("session rejected by remote cart service")]
    Unauthorized,

    #[error("remote cart service unavailable: {0}")]
    Unavailable(String),
}

/// Failures of the local key-value storage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage quota exceeded writing '{key}': {needed} bytes needed, quota is {quota}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },

    #[error("storage I/O error: {0}")]
    Io(String),

    #[error("failed to encode cart: {0}")]
    Encode(String),
}

/// Errors returned by [`CartStore`](crate::CartStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("remote cart error: {0}")]
    Remote(#[from] RemoteError),

    #[error("local storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Engine(#[from] basket_engine::Error),

    #[error("cart migration aborted after {migrated} of {total} lines: {source}")]
    Migration {
        migrated: usize,
        total: usize,
        source: RemoteError,
    },
}

impl StoreError {
    /// Whether the failure came from local persistence. Callers that only
    /// care about keeping the UI alive may ignore these.
    pub fn is_storage(&self) -> bool {
        matches!(self, StoreError::Storage(_))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
