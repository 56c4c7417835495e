//! PostgreSQL implementation of SessionTable.
//!
//! Rows are never removed by the database itself; [`spawn_expiry_reaper`]
//! deletes expired rows on an interval. Until a sweep runs, expired rows stay
//! visible to `get` and `query_by_username`, which the port allows.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tokio::task::JoinHandle;

use crate::config::DatabaseConfig;
use crate::domain::foundation::{SessionId, Timestamp, Username};
use crate::domain::session::Session;
use crate::ports::{Clock, IndexEntry, PutOutcome, SessionTable, TableError};

/// PostgreSQL implementation of [`SessionTable`].
#[derive(Clone)]
pub struct PostgresSessionTable {
    pool: PgPool,
}

impl PostgresSessionTable {
    /// Creates a table over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool using `config`, running migrations when enabled.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, TableError> {
        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect(config.url.expose_secret())
            .await
            .map_err(map_sqlx_error)?;

        if config.run_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| TableError::Unavailable(format!("Migration failed: {}", e)))?;
            tracing::info!("Session table migrations applied");
        }

        Ok(Self::new(pool))
    }

    /// Deletes every row expired at `now`, returning how many were removed.
    pub async fn purge_expired(&self, now: Timestamp) -> Result<u64, TableError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SessionTable for PostgresSessionTable {
    async fn put_if_absent(
        &self,
        session: &Session,
        now: Timestamp,
    ) -> Result<PutOutcome, TableError> {
        // An existing row is only replaced once it has expired.
        let result = sqlx::query(
            r#"
            INSERT INTO sessions (id, username, payload, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                payload = EXCLUDED.payload,
                created_at = EXCLUDED.created_at,
                expires_at = EXCLUDED.expires_at
            WHERE sessions.expires_at <= $6
            "#,
        )
        .bind(session.id().as_str())
        .bind(session.username().as_str())
        .bind(session.payload())
        .bind(session.created_at().as_datetime())
        .bind(session.expires_at().as_datetime())
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(if result.rows_affected() == 0 {
            PutOutcome::AlreadyExists
        } else {
            PutOutcome::Created
        })
    }

    async fn get(&self, id: &SessionId) -> Result<Option<Session>, TableError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, payload, created_at, expires_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(row_to_session).transpose()
    }

    async fn query_by_username(
        &self,
        username: &Username,
    ) -> Result<Vec<IndexEntry>, TableError> {
        let rows = sqlx::query(
            "SELECT id, expires_at FROM sessions WHERE username = $1 ORDER BY id",
        )
        .bind(username.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                let id: String = column(&row, "id")?;
                let expires_at: DateTime<Utc> = column(&row, "expires_at")?;
                Ok(IndexEntry {
                    session_id: SessionId::new(id)
                        .map_err(|e| TableError::Corrupt(e.to_string()))?,
                    expires_at: Timestamp::from_datetime(expires_at),
                })
            })
            .collect()
    }

    async fn delete(&self, username: &Username, id: &SessionId) -> Result<bool, TableError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1 AND username = $2")
            .bind(id.as_str())
            .bind(username.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), TableError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

/// Spawns a task that deletes expired rows every `interval`.
///
/// Failed sweeps are logged and retried on the next tick. Abort the returned
/// handle to stop the task.
pub fn spawn_expiry_reaper(
    table: PostgresSessionTable,
    clock: Arc<dyn Clock>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match table.purge_expired(clock.now()).await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Reaped expired sessions"),
                Err(e) => tracing::warn!(error = %e, "Expired session sweep failed"),
            }
        }
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn map_sqlx_error(e: sqlx::Error) -> TableError {
    match e {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            TableError::Corrupt(e.to_string())
        }
        _ => TableError::Unavailable(e.to_string()),
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, TableError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| TableError::Corrupt(format!("Failed to get {}: {}", name, e)))
}

fn row_to_session(row: PgRow) -> Result<Session, TableError> {
    let id: String = column(&row, "id")?;
    let username: String = column(&row, "username")?;
    let payload: String = column(&row, "payload")?;
    let created_at: DateTime<Utc> = column(&row, "created_at")?;
    let expires_at: DateTime<Utc> = column(&row, "expires_at")?;

    Ok(Session::reconstitute(
        SessionId::new(id).map_err(|e| TableError::Corrupt(e.to_string()))?,
        Username::new(username).map_err(|e| TableError::Corrupt(e.to_string()))?,
        payload,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(expires_at),
    ))
}
