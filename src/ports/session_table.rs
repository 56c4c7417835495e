//! Session table port.
//!
//! Defines the contract of the storage backend: keyed items with one
//! secondary index on `username` and an expiry attribute the backend uses to
//! reclaim items on its own.
//!
//! # Consistency
//!
//! - `get` must observe a `put_if_absent` that completed before it (read-your-write)
//! - `query_by_username` may lag behind recent writes
//! - `get` may return items that are expired but not yet reclaimed; callers
//!   filter them against their clock

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{SessionId, Timestamp, Username};
use crate::domain::session::Session;

/// Errors raised by a session table backend.
#[derive(Debug, Clone, Error)]
pub enum TableError {
    #[error("Session table unavailable: {0}")]
    Unavailable(String),

    #[error("Session table call exceeded deadline of {0:?}")]
    Timeout(Duration),

    #[error("Stored session record is unreadable: {0}")]
    Corrupt(String),
}

impl TableError {
    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, TableError::Unavailable(_) | TableError::Timeout(_))
    }
}

/// Outcome of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The item was written.
    Created,
    /// A live item with the same id already exists; nothing was written.
    AlreadyExists,
}

/// Projection of a session as stored in the username index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub session_id: SessionId,
    pub expires_at: Timestamp,
}

/// Storage port for session items.
#[async_trait]
pub trait SessionTable: Send + Sync {
    /// Write `session` unless a live item with the same id exists at `now`.
    ///
    /// An expired item with the same id is overwritten.
    async fn put_if_absent(
        &self,
        session: &Session,
        now: Timestamp,
    ) -> Result<PutOutcome, TableError>;

    /// Fetch an item by primary key.
    async fn get(&self, id: &SessionId) -> Result<Option<Session>, TableError>;

    /// List index entries for every item owned by `username`.
    async fn query_by_username(&self, username: &Username)
        -> Result<Vec<IndexEntry>, TableError>;

    /// Delete the item `id` if `username` owns it.
    ///
    /// An item owned by another user is left untouched; the `(username, id)`
    /// index entry is removed either way. Idempotent; returns whether an item
    /// was removed.
    async fn delete(&self, username: &Username, id: &SessionId) -> Result<bool, TableError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), TableError>;
}
