//! Error types for store operations.
//!
//! Every backend (relational table, in-memory tree, SQLite tree, REST tree)
//! reports failures through [`StoreError`]; the HTTP layer decides which of
//! them are the client's fault and which become a generic 500.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A tree key or path is malformed.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Cannot connect to or communicate with the storage backend.
    #[error("connection error: {0}")]
    ConnectionError(String),

    /// A stored value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// A remote backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    /// Database error from SQLx.
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Transport error from the REST client.
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Shorthand for a missing deck.
    pub fn deck_not_found(id: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind: "Deck",
            id: id.into(),
        }
    }

    /// Returns true if the error means the record is absent rather than that
    /// the backend failed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::SerializationError(err.to_string())
    }
}
