//! Session entity.
//!
//! A session associates a user with an opaque payload until its expiry.
//!
//! # Invariants
//!
//! - `expires_at` is strictly after `created_at` (the write time)
//! - a session is live iff `now < expires_at`

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SessionId, Timestamp, Username, ValidationError};

/// A stored, expiring session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Primary key.
    id: SessionId,

    /// Owner; the secondary-index key.
    username: Username,

    /// Application-defined data, never interpreted.
    payload: String,

    /// When the session was written.
    created_at: Timestamp,

    /// When the session stops being observable.
    expires_at: Timestamp,
}

impl Session {
    /// Create a new session written at `created_at`.
    ///
    /// Both timestamps are truncated to whole seconds, the granularity of the
    /// stored expiry attribute.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` if `expires_at` is not strictly after `created_at`
    pub fn new(
        id: SessionId,
        username: Username,
        payload: String,
        created_at: Timestamp,
        expires_at: Timestamp,
    ) -> Result<Self, ValidationError> {
        let created_at = created_at.truncate_to_secs();
        let expires_at = expires_at.truncate_to_secs();

        if !expires_at.is_after(&created_at) {
            return Err(ValidationError::invalid_format(
                "expiresAt",
                "must be strictly in the future",
            ));
        }

        Ok(Self {
            id,
            username,
            payload,
            created_at,
            expires_at,
        })
    }

    /// Reconstitute a session from persistence (no validation).
    pub fn reconstitute(
        id: SessionId,
        username: Username,
        payload: String,
        created_at: Timestamp,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            id,
            username,
            payload,
            created_at,
            expires_at,
        }
    }

    /// Returns the session ID.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the owner's username.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Returns the opaque payload.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Returns when the session was written.
    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// Returns when the session expires.
    pub fn expires_at(&self) -> &Timestamp {
        &self.expires_at
    }

    /// Whether the session is expired at `now`.
    pub fn is_expired_at(&self, now: &Timestamp) -> bool {
        !now.is_before(&self.expires_at)
    }
}
