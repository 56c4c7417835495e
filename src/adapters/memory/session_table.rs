//! In-memory session table.
//!
//! Keeps items and the username index in process memory.
//! Useful for testing and single-node development.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{SessionId, Timestamp, Username};
use crate::domain::session::Session;
use crate::ports::{IndexEntry, PutOutcome, SessionTable, TableError};

/// In-memory implementation of [`SessionTable`].
///
/// Expired items stay readable through `get` until [`purge_expired`] runs,
/// mirroring a backend whose expiry sweep lags behind the clock.
///
/// [`purge_expired`]: InMemorySessionTable::purge_expired
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionTable {
    state: Arc<RwLock<TableState>>,
}

#[derive(Debug, Default)]
struct TableState {
    items: HashMap<SessionId, Session>,
    by_username: HashMap<Username, BTreeSet<SessionId>>,
}

impl TableState {
    fn unindex(&mut self, username: &Username, id: &SessionId) {
        if let Some(ids) = self.by_username.get_mut(username) {
            ids.remove(id);
            if ids.is_empty() {
                self.by_username.remove(username);
            }
        }
    }

    fn remove(&mut self, id: &SessionId) -> Option<Session> {
        let removed = self.items.remove(id)?;
        self.unindex(removed.username(), id);
        Some(removed)
    }
}

impl InMemorySessionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reclaim every item expired at `now`, returning how many were removed.
    pub async fn purge_expired(&self, now: Timestamp) -> usize {
        let mut state = self.state.write().await;
        let expired: Vec<SessionId> = state
            .items
            .values()
            .filter(|s| s.is_expired_at(&now))
            .map(|s| s.id().clone())
            .collect();

        for id in &expired {
            state.remove(id);
        }
        expired.len()
    }

    /// Number of stored items, expired or not.
    pub async fn len(&self) -> usize {
        self.state.read().await.items.len()
    }

    /// Whether the table holds no items.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.items.is_empty()
    }
}

#[async_trait]
impl SessionTable for InMemorySessionTable {
    async fn put_if_absent(
        &self,
        session: &Session,
        now: Timestamp,
    ) -> Result<PutOutcome, TableError> {
        let mut state = self.state.write().await;

        if let Some(existing) = state.items.get(session.id()) {
            if !existing.is_expired_at(&now) {
                return Ok(PutOutcome::AlreadyExists);
            }
            state.remove(session.id());
        }

        state
            .by_username
            .entry(session.username().clone())
            .or_default()
            .insert(session.id().clone());
        state.items.insert(session.id().clone(), session.clone());

        Ok(PutOutcome::Created)
    }

    async fn get(&self, id: &SessionId) -> Result<Option<Session>, TableError> {
        Ok(self.state.read().await.items.get(id).cloned())
    }

    async fn query_by_username(
        &self,
        username: &Username,
    ) -> Result<Vec<IndexEntry>, TableError> {
        let state = self.state.read().await;
        let entries = state
            .by_username
            .get(username)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.items.get(id))
                    .map(|s| IndexEntry {
                        session_id: s.id().clone(),
                        expires_at: *s.expires_at(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(entries)
    }

    async fn delete(&self, username: &Username, id: &SessionId) -> Result<bool, TableError> {
        let mut state = self.state.write().await;
        let owned = state
            .items
            .get(id)
            .is_some_and(|s| s.username() == username);
        let removed = owned && state.remove(id).is_some();
        state.unindex(username, id);
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), TableError> {
        Ok(())
    }
}
