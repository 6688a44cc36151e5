//! Error types for the cache layer.

use thiserror::Error;
use vetsync_storage::StorageError;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur in the cache layer.
///
/// Read paths rarely surface these: a corrupt namespace is treated as a
/// miss and falls through to the network, so most variants only appear on
/// writes or lifecycle operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The underlying storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A cache entry could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),
}

impl CacheError {
    /// Creates a [`CacheError::Codec`] from any display-able cause.
    pub(crate) fn codec(err: impl std::fmt::Display) -> Self {
        CacheError::Codec(err.to_string())
    }
}
