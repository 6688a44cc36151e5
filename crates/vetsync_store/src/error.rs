//! Error types for the local store.

use std::io;
use thiserror::Error;
use uuid::Uuid;
use vetsync_protocol::OperationStatus;
use vetsync_storage::StorageError;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during local store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A storage backend error occurred.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Another process holds the store lock.
    #[error("store is locked by another process")]
    Locked,

    /// The store directory does not exist and creation was not requested.
    #[error("store directory does not exist: {0}")]
    MissingDirectory(String),

    /// A log record could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// An operation id was not found in the queue.
    #[error("unknown operation: {0}")]
    UnknownOperation(Uuid),

    /// A status transition was attempted from a terminal state.
    ///
    /// Persisted transitions are one-directional: completed and failed
    /// operations are history, never re-sent.
    #[error("operation {id} is already {status:?}")]
    InvalidTransition {
        /// The operation id.
        id: Uuid,
        /// The operation's current terminal status.
        status: OperationStatus,
    },
}

impl StoreError {
    /// Creates a codec error with the given message.
    pub fn codec(message: impl ToString) -> Self {
        Self::Codec(message.to_string())
    }
}
