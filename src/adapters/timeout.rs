//! Deadline-enforcing decorator for any [`SessionTable`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::{SessionId, Timestamp, Username};
use crate::domain::session::Session;
use crate::ports::{IndexEntry, PutOutcome, SessionTable, TableError};

/// Wraps a table so every call fails with [`TableError::Timeout`] once
/// `deadline` elapses.
///
/// The inner future is dropped on expiry, cancelling the backend call.
#[derive(Clone)]
pub struct TimeoutSessionTable {
    inner: Arc<dyn SessionTable>,
    deadline: Duration,
}

impl TimeoutSessionTable {
    pub fn new(inner: Arc<dyn SessionTable>, deadline: Duration) -> Self {
        Self { inner, deadline }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, TableError>> + Send,
    ) -> Result<T, TableError> {
        match tokio::time::timeout(self.deadline, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    deadline_ms = self.deadline.as_millis() as u64,
                    "Session table call timed out"
                );
                Err(TableError::Timeout(self.deadline))
            }
        }
    }
}

#[async_trait]
impl SessionTable for TimeoutSessionTable {
    async fn put_if_absent(
        &self,
        session: &Session,
        now: Timestamp,
    ) -> Result<PutOutcome, TableError> {
        self.bounded("put_if_absent", self.inner.put_if_absent(session, now))
            .await
    }

    async fn get(&self, id: &SessionId) -> Result<Option<Session>, TableError> {
        self.bounded("get", self.inner.get(id)).await
    }

    async fn query_by_username(
        &self,
        username: &Username,
    ) -> Result<Vec<IndexEntry>, TableError> {
        self.bounded("query_by_username", self.inner.query_by_username(username))
            .await
    }

    async fn delete(&self, username: &Username, id: &SessionId) -> Result<bool, TableError> {
        self.bounded("delete", self.inner.delete(username, id)).await
    }

    async fn ping(&self) -> Result<(), TableError> {
        self.bounded("ping", self.inner.ping()).await
    }
}
