//! Directory error taxonomy.
//!
//! Four kinds, never collapsed: transport problems, rejected credentials,
//! missing entities, and everything else the protocol reports.

use thiserror::Error;

/// Error from a directory operation.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Network failure or timeout reaching the directory.
    #[error("cannot reach directory: {message}")]
    Connection { message: String },

    /// The admin credentials were rejected.
    #[error("directory authentication failed: {message}")]
    Auth { message: String },

    /// The requested remote entity does not exist.
    #[error("not found in directory: {0}")]
    NotFound(String),

    /// Any other protocol fault or HTTP-level failure, with the directory's
    /// fault code when it supplied one.
    #[error("directory API error: {message}")]
    Api {
        message: String,
        code: Option<String>,
    },
}

impl DirectoryError {
    /// Create a connection error from any displayable source.
    pub fn connection(message: impl std::fmt::Display) -> Self {
        Self::Connection {
            message: message.to_string(),
        }
    }

    /// Create an API error without a fault code.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            code: None,
        }
    }

    /// Whether retrying the same call later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;
