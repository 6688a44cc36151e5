//! Error types for protocol parsing and validation.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur constructing or parsing protocol values.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A tenant context component was empty.
    ///
    /// Storage access fails closed without a fully resolved tenant.
    #[error("incomplete tenant context: {field} is empty")]
    IncompleteTenantContext {
        /// The name of the missing component.
        field: &'static str,
    },

    /// An entity type name was not in the tracked catalogue.
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    /// An HTTP method string was not recognized.
    #[error("unknown HTTP method: {0}")]
    UnknownMethod(String),

    /// A JSON body could not be decoded.
    #[error("malformed body: {0}")]
    MalformedBody(#[from] serde_json::Error),
}
