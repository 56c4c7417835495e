//! HTTP DTOs for session endpoints.
//!
//! These types decouple the HTTP API from domain types. Field names are
//! camelCase on the wire and instants are Unix seconds.

use serde::{Deserialize, Serialize};

use crate::application::handlers::session::{CreateSessionCommand, DeleteUserSessionsResult};
use crate::domain::session::Session;

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to create a new session.
///
/// Every field is optional at the serde level so that missing fields are
/// reported by the handler as validation errors (400) rather than as
/// deserialization failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub username: Option<String>,
    pub payload: Option<String>,
    pub ttl_seconds: Option<i64>,
    pub expires_at: Option<i64>,
    pub session_id: Option<String>,
}

impl From<CreateSessionRequest> for CreateSessionCommand {
    fn from(req: CreateSessionRequest) -> Self {
        Self {
            username: req.username,
            payload: req.payload,
            ttl_seconds: req.ttl_seconds,
            expires_at: req.expires_at,
            session_id: req.session_id,
        }
    }
}

/// Query parameters for `GET /sessions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionLookupParams {
    pub id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// A stored session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub username: String,
    pub payload: String,
    pub created_at: i64,
    pub expires_at: i64,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            session_id: session.id().to_string(),
            username: session.username().to_string(),
            created_at: session.created_at().as_unix_secs(),
            expires_at: session.expires_at().as_unix_secs(),
            payload: session.payload().to_string(),
        }
    }
}

/// Outcome of deleting every session of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSessionsResponse {
    pub username: String,
    pub deleted_count: usize,
}

impl From<DeleteUserSessionsResult> for DeleteSessionsResponse {
    fn from(result: DeleteUserSessionsResult) -> Self {
        Self {
            username: result.username.to_string(),
            deleted_count: result.deleted_count,
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new("SERVICE_UNAVAILABLE", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}
