//! DeleteUserSessionsHandler - Command handler for removing every session a
//! user owns.
//!
//! The index is queried once and each entry is deleted by primary key. The
//! operation is not atomic: a session created after the query is not removed.

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::config::SessionsConfig;
use crate::domain::foundation::Username;
use crate::domain::session::SessionError;
use crate::ports::{Clock, SessionTable, TableError};

/// Command to delete all sessions of a user.
#[derive(Debug, Clone)]
pub struct DeleteUserSessionsCommand {
    pub username: String,
}

/// Result of a bulk delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteUserSessionsResult {
    pub username: Username,
    /// Live sessions removed; expired leftovers are cleaned up but not counted.
    pub deleted_count: usize,
}

/// Handler for bulk deletion via the username index.
pub struct DeleteUserSessionsHandler {
    table: Arc<dyn SessionTable>,
    clock: Arc<dyn Clock>,
    concurrency: usize,
}

impl DeleteUserSessionsHandler {
    pub fn new(table: Arc<dyn SessionTable>, clock: Arc<dyn Clock>, concurrency: usize) -> Self {
        Self {
            table,
            clock,
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_config(
        table: Arc<dyn SessionTable>,
        clock: Arc<dyn Clock>,
        config: &SessionsConfig,
    ) -> Self {
        Self::new(table, clock, config.delete_concurrency)
    }

    /// Deletes every indexed session of the user.
    ///
    /// Every per-item delete is attempted even when some fail; the first
    /// failure is then returned. Deletes are idempotent, so retrying the
    /// whole command is safe.
    pub async fn handle(
        &self,
        cmd: DeleteUserSessionsCommand,
    ) -> Result<DeleteUserSessionsResult, SessionError> {
        let username = Username::new(cmd.username)?;

        let entries = self.table.query_by_username(&username).await?;
        let now = self.clock.now();

        let table = &self.table;
        let owner = &username;
        let outcomes: Vec<(bool, Result<bool, TableError>)> = stream::iter(entries)
            .map(move |entry| async move {
                let live = now.is_before(&entry.expires_at);
                (live, table.delete(owner, &entry.session_id).await)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut deleted_count = 0;
        let mut failures = Vec::new();
        for (live, outcome) in outcomes {
            match outcome {
                Ok(true) if live => deleted_count += 1,
                Ok(_) => {}
                Err(e) => failures.push(e),
            }
        }

        if let Some(first) = failures.into_iter().next() {
            tracing::warn!(
                username = %username,
                deleted_count,
                error = %first,
                "Bulk session delete partially failed"
            );
            return Err(first.into());
        }

        tracing::info!(username = %username, deleted_count, "Deleted user sessions");

        Ok(DeleteUserSessionsResult {
            username,
            deleted_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySessionTable;
    use crate::adapters::system::ManualClock;
    use crate::domain::foundation::{SessionId, Timestamp};
    use crate::domain::session::Session;
    use crate::ports::{IndexEntry, PutOutcome};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory table that fails deletes of one specific id.
    struct FlakyDeleteTable {
        inner: InMemorySessionTable,
        poisoned_id: &'static str,
        delete_calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SessionTable for FlakyDeleteTable {
        async fn put_if_absent(
            &self,
            session: &Session,
            now: Timestamp,
        ) -> Result<PutOutcome, TableError> {
            self.inner.put_if_absent(session, now).await
        }

        async fn get(&self, id: &SessionId) -> Result<Option<Session>, TableError> {
            self.inner.get(id).await
        }

        async fn query_by_username(
            &self,
            username: &Username,
        ) -> Result<Vec<IndexEntry>, TableError> {
            self.inner.query_by_username(username).await
        }

        async fn delete(&self, username: &Username, id: &SessionId) -> Result<bool, TableError> {
            self.delete_calls.lock().unwrap().push(id.to_string());
            if id.as_str() == self.poisoned_id {
                return Err(TableError::Unavailable("Simulated delete failure".to_string()));
            }
            self.inner.delete(username, id).await
        }

        async fn ping(&self) -> Result<(), TableError> {
            Ok(())
        }
    }

    /// Index that still lists an id its owner no longer holds.
    struct StaleIndexTable {
        inner: InMemorySessionTable,
        stale: IndexEntry,
    }

    #[async_trait]
    impl SessionTable for StaleIndexTable {
        async fn put_if_absent(
            &self,
            session: &Session,
            now: Timestamp,
        ) -> Result<PutOutcome, TableError> {
            self.inner.put_if_absent(session, now).await
        }

        async fn get(&self, id: &SessionId) -> Result<Option<Session>, TableError> {
            self.inner.get(id).await
        }

        async fn query_by_username(
            &self,
            username: &Username,
        ) -> Result<Vec<IndexEntry>, TableError> {
            let mut entries = self.inner.query_by_username(username).await?;
            if username.as_str() == "alice" {
                entries.push(self.stale.clone());
            }
            Ok(entries)
        }

        async fn delete(&self, username: &Username, id: &SessionId) -> Result<bool, TableError> {
            self.inner.delete(username, id).await
        }

        async fn ping(&self) -> Result<(), TableError> {
            Ok(())
        }
    }

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    async fn seed(table: &dyn SessionTable, id: &str, user: &str, expires: i64) {
        let session = Session::new(
            SessionId::new(id).unwrap(),
            Username::new(user).unwrap(),
            String::new(),
            ts(1_000),
            ts(expires),
        )
        .unwrap();
        table.put_if_absent(&session, ts(1_000)).await.unwrap();
    }

    fn command(username: &str) -> DeleteUserSessionsCommand {
        DeleteUserSessionsCommand {
            username: username.to_string(),
        }
    }

    #[tokio::test]
    async fn deletes_all_sessions_of_user_only() {
        let table = InMemorySessionTable::new();
        seed(&table, "a1", "alice", 5_000).await;
        seed(&table, "a2", "alice", 6_000).await;
        seed(&table, "b1", "bob", 5_000).await;

        let handler = DeleteUserSessionsHandler::new(
            Arc::new(table.clone()),
            Arc::new(ManualClock::at_unix_secs(2_000)),
            2,
        );
        let result = handler.handle(command("alice")).await.unwrap();

        assert_eq!(result.deleted_count, 2);
        assert_eq!(result.username.as_str(), "alice");
        assert!(table.get(&SessionId::new("a1").unwrap()).await.unwrap().is_none());
        assert!(table.get(&SessionId::new("a2").unwrap()).await.unwrap().is_none());
        assert!(table.get(&SessionId::new("b1").unwrap()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn returns_zero_for_user_without_sessions() {
        let handler = DeleteUserSessionsHandler::new(
            Arc::new(InMemorySessionTable::new()),
            Arc::new(ManualClock::at_unix_secs(2_000)),
            8,
        );

        let result = handler.handle(command("nobody")).await.unwrap();
        assert_eq!(result.deleted_count, 0);
    }

    #[tokio::test]
    async fn expired_entries_are_removed_but_not_counted() {
        let table = InMemorySessionTable::new();
        seed(&table, "old", "alice", 1_500).await;
        seed(&table, "live", "alice", 5_000).await;

        let handler = DeleteUserSessionsHandler::new(
            Arc::new(table.clone()),
            Arc::new(ManualClock::at_unix_secs(2_000)),
            8,
        );
        let result = handler.handle(command("alice")).await.unwrap();

        assert_eq!(result.deleted_count, 1);
        assert!(table.is_empty().await);
    }

    #[tokio::test]
    async fn stale_index_entry_does_not_delete_reused_id_of_other_user() {
        let table = Arc::new(StaleIndexTable {
            inner: InMemorySessionTable::new(),
            stale: IndexEntry {
                session_id: SessionId::new("x").unwrap(),
                expires_at: ts(1_500),
            },
        });
        seed(table.as_ref(), "a1", "alice", 5_000).await;
        seed(table.as_ref(), "x", "bob", 9_000).await;

        let handler = DeleteUserSessionsHandler::new(
            table.clone(),
            Arc::new(ManualClock::at_unix_secs(2_000)),
            4,
        );
        let result = handler.handle(command("alice")).await.unwrap();

        assert_eq!(result.deleted_count, 1);
        let bobs = table.get(&SessionId::new("x").unwrap()).await.unwrap();
        assert_eq!(bobs.map(|s| s.username().to_string()), Some("bob".to_string()));
        assert!(table.get(&SessionId::new("a1").unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_blank_username() {
        let handler = DeleteUserSessionsHandler::new(
            Arc::new(InMemorySessionTable::new()),
            Arc::new(ManualClock::at_unix_secs(2_000)),
            8,
        );

        let result = handler.handle(command("  ")).await;
        assert!(matches!(result, Err(SessionError::ValidationFailed { .. })));
    }

    #[tokio::test]
    async fn attempts_every_delete_before_reporting_failure() {
        let table = Arc::new(FlakyDeleteTable {
            inner: InMemorySessionTable::new(),
            poisoned_id: "a2",
            delete_calls: Mutex::new(Vec::new()),
        });
        seed(table.as_ref(), "a1", "alice", 5_000).await;
        seed(table.as_ref(), "a2", "alice", 5_000).await;
        seed(table.as_ref(), "a3", "alice", 5_000).await;

        let handler = DeleteUserSessionsHandler::new(
            table.clone(),
            Arc::new(ManualClock::at_unix_secs(2_000)),
            1,
        );
        let result = handler.handle(command("alice")).await;

        assert!(matches!(result, Err(SessionError::Storage(TableError::Unavailable(_)))));
        assert_eq!(table.delete_calls.lock().unwrap().len(), 3);
        assert_eq!(table.inner.len().await, 1);
    }

    #[tokio::test]
    async fn retry_after_partial_failure_is_safe() {
        let table = Arc::new(FlakyDeleteTable {
            inner: InMemorySessionTable::new(),
            poisoned_id: "a2",
            delete_calls: Mutex::new(Vec::new()),
        });
        seed(table.as_ref(), "a1", "alice", 5_000).await;
        seed(table.as_ref(), "a2", "alice", 5_000).await;

        let clock = Arc::new(ManualClock::at_unix_secs(2_000));
        let flaky = DeleteUserSessionsHandler::new(table.clone(), clock.clone(), 4);
        assert!(flaky.handle(command("alice")).await.is_err());

        // Same items, healthy backend.
        let healthy = DeleteUserSessionsHandler::new(Arc::new(table.inner.clone()), clock, 4);
        let result = healthy.handle(command("alice")).await.unwrap();

        assert_eq!(result.deleted_count, 1);
        assert!(table.inner.is_empty().await);
    }
}
