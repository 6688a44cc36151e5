//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The storage contents are corrupted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// A log record checksum did not match its contents.
    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// The CRC32 stored in the record envelope.
        stored: u32,
        /// The CRC32 computed over the record bytes.
        computed: u32,
    },

    /// A record payload exceeded the 4-byte length field.
    #[error("record payload too large: {0} bytes")]
    PayloadTooLarge(usize),
}

impl StorageError {
    /// Creates a corruption error with the given message.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }
}
