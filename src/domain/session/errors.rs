//! Session-specific error types.

use thiserror::Error;

use crate::domain::foundation::{SessionId, ValidationError};
use crate::ports::TableError;

/// Errors returned by the session handlers.
///
/// The HTTP adapter is the only place these are translated to status codes.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Malformed input; never retried.
    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    /// Session is absent or expired.
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    /// A caller-supplied id collides with a live session.
    #[error("Session already exists: {0}")]
    Conflict(SessionId),

    /// Backend unavailable, timed out or returned unreadable data.
    #[error("Storage error: {0}")]
    Storage(#[from] TableError),

    /// Every generated id collided with a live session.
    #[error("Could not generate a unique session id after {attempts} attempts")]
    KeyGenerationExhausted { attempts: u32 },
}

impl SessionError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SessionError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(id: SessionId) -> Self {
        SessionError::NotFound(id)
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Storage(e) if e.is_transient())
    }
}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        SessionError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}
