//! Error types for the sync engine.

use thiserror::Error;
use vetsync_protocol::ProtocolError;
use vetsync_store::StoreError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur during queue drain or reconciliation pull.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The local store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A protocol value could not be built or parsed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The network transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] crate::http::HttpError),

    /// The pull endpoint rejected the request.
    #[error("pull rejected with status {status}")]
    PullRejected {
        /// The HTTP status returned.
        status: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpError;

    #[test]
    fn error_display() {
        let err = EngineError::Transport(HttpError::Timeout);
        assert_eq!(err.to_string(), "transport error: request timed out");

        let err = EngineError::PullRejected { status: 503 };
        assert!(err.to_string().contains("503"));
    }
}
