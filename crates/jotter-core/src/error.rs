//! Error types for jotter.

use thiserror::Error;

/// Result type alias using jotter's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for jotter operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Entity is absent or owned by another user.
    ///
    /// The two cases are indistinguishable to callers.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness violation (label name per user, email per account)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A live connection failed to read or write its transport
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// A live connection's outbound queue was full
    #[error("Outbound queue overflow for connection {0}")]
    QueueOverflow(uuid::Uuid),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Not-found error for a note id.
    pub fn note_not_found(id: uuid::Uuid) -> Self {
        Error::NotFound(format!("note {} not found", id))
    }

    /// Not-found error for a label id.
    pub fn label_not_found(id: uuid::Uuid) -> Self {
        Error::NotFound(format!("label {} not found", id))
    }

    /// Not-found error for a user id.
    pub fn user_not_found(id: uuid::Uuid) -> Self {
        Error::NotFound(format!("user {} not found", id))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
