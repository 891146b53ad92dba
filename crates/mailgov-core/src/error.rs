//! Shared error type for local-store operations.

use thiserror::Error;

/// Error from a local-store operation behind one of the store traits.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error.
    #[error("database error: {0}")]
    Database(String),

    /// The requested record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Serialization error while persisting a JSON payload.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Create a database error from any displayable source.
    pub fn database(err: impl std::fmt::Display) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
