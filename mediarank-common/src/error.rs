//! Common error types for MediaRank

use thiserror::Error;

/// Common result type for MediaRank operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across MediaRank crates
#[derive(Error, Debug)]
pub enum Error {
    /// Bad rank value, missing required field, unsupported operation input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation attempted without a signed-in user
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Record store read/write failure (wraps sqlx::Error)
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Search provider unreachable or returned a non-2xx status
    #[error("Network error: {0}")]
    Network(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request conflicts with existing state (e.g. already a family member)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Authenticated user is not allowed to perform the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored document could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for the "no signed-in user" failure
    pub fn unauthenticated() -> Self {
        Error::Authentication("User not authenticated".to_string())
    }
}
