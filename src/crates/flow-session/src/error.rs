//! Error types for session store operations

use crate::session::SessionStatus;
use thiserror::Error;
use uuid::Uuid;

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that can occur during session store operations
#[derive(Error, Debug)]
pub enum SessionError {
    /// Session not found
    #[error("Session not found: {0}")]
    NotFound(Uuid),

    /// The requested status transition is not legal
    #[error("Illegal session transition {from:?} -> {to:?}")]
    InvalidTransition {
        /// Status the caller expected
        from: SessionStatus,
        /// Status the caller requested
        to: SessionStatus,
    },

    /// Compare-and-set lost: the session is no longer in the expected status
    #[error("Session {session_id} is {actual:?}, not {expected:?}")]
    Conflict {
        /// Session whose transition failed
        session_id: Uuid,
        /// Status the caller expected to find
        expected: SessionStatus,
        /// Status actually stored
        actual: SessionStatus,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}
