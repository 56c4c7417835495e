//! CreateSessionHandler - Command handler for creating new sessions.

use std::sync::Arc;

use crate::config::SessionsConfig;
use crate::domain::foundation::{SessionId, Timestamp, Username, ValidationError};
use crate::domain::session::{Session, SessionError};
use crate::ports::{Clock, PutOutcome, SessionIdGenerator, SessionTable};

/// Command to create a new session.
///
/// Fields arrive unvalidated from the transport layer; `None` means the field
/// was absent from the request.
#[derive(Debug, Clone, Default)]
pub struct CreateSessionCommand {
    pub username: Option<String>,
    pub payload: Option<String>,
    /// Lifetime relative to now, in seconds.
    pub ttl_seconds: Option<i64>,
    /// Absolute expiry as Unix seconds.
    pub expires_at: Option<i64>,
    /// Caller-chosen key; generated when absent.
    pub session_id: Option<String>,
}

/// Limits applied to new sessions.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub default_ttl_secs: u64,
    pub max_ttl_secs: u64,
    pub max_payload_bytes: usize,
    pub key_generation_attempts: u32,
}

impl From<&SessionsConfig> for SessionPolicy {
    fn from(config: &SessionsConfig) -> Self {
        Self {
            default_ttl_secs: config.default_ttl_secs,
            max_ttl_secs: config.max_ttl_secs,
            max_payload_bytes: config.max_payload_bytes,
            key_generation_attempts: config.key_generation_attempts,
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::from(&SessionsConfig::default())
    }
}

/// Handler for creating sessions.
pub struct CreateSessionHandler {
    table: Arc<dyn SessionTable>,
    clock: Arc<dyn Clock>,
    id_generator: Arc<dyn SessionIdGenerator>,
    policy: SessionPolicy,
}

impl CreateSessionHandler {
    pub fn new(
        table: Arc<dyn SessionTable>,
        clock: Arc<dyn Clock>,
        id_generator: Arc<dyn SessionIdGenerator>,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            table,
            clock,
            id_generator,
            policy,
        }
    }

    pub async fn handle(&self, cmd: CreateSessionCommand) -> Result<Session, SessionError> {
        let now = self.clock.now().truncate_to_secs();

        // 1. Validate input before touching storage
        let username = match cmd.username {
            Some(raw) => Username::new(raw)?,
            None => return Err(SessionError::validation("username", "is required")),
        };
        let payload = self.validate_payload(cmd.payload)?;
        let expires_at = self.resolve_expiry(cmd.ttl_seconds, cmd.expires_at, now)?;

        // 2. Write with the caller's id, or with generated ids until one is free
        let session = match cmd.session_id {
            Some(raw) => {
                let session_id = SessionId::new(raw)?;
                let session = Session::new(session_id, username, payload, now, expires_at)?;
                match self.table.put_if_absent(&session, now).await? {
                    PutOutcome::Created => session,
                    PutOutcome::AlreadyExists => {
                        return Err(SessionError::Conflict(session.id().clone()));
                    }
                }
            }
            None => {
                self.insert_with_generated_id(username, payload, now, expires_at)
                    .await?
            }
        };

        tracing::info!(
            session_id = %session.id(),
            username = %session.username(),
            expires_at = session.expires_at().as_unix_secs(),
            "Session created"
        );

        Ok(session)
    }

    async fn insert_with_generated_id(
        &self,
        username: Username,
        payload: String,
        now: Timestamp,
        expires_at: Timestamp,
    ) -> Result<Session, SessionError> {
        let attempts = self.policy.key_generation_attempts;

        for attempt in 1..=attempts {
            let session = Session::new(
                self.id_generator.generate(),
                username.clone(),
                payload.clone(),
                now,
                expires_at,
            )?;

            match self.table.put_if_absent(&session, now).await? {
                PutOutcome::Created => return Ok(session),
                PutOutcome::AlreadyExists => {
                    tracing::warn!(
                        attempt,
                        session_id = %session.id(),
                        "Generated session id collided with a live session"
                    );
                }
            }
        }

        Err(SessionError::KeyGenerationExhausted { attempts })
    }

    fn validate_payload(&self, payload: Option<String>) -> Result<String, SessionError> {
        let payload =
            payload.ok_or_else(|| SessionError::validation("payload", "is required"))?;

        if payload.len() > self.policy.max_payload_bytes {
            return Err(ValidationError::too_long(
                "payload",
                self.policy.max_payload_bytes,
                payload.len(),
            )
            .into());
        }
        Ok(payload)
    }

    /// Turns the two mutually exclusive expiry forms into an absolute instant.
    fn resolve_expiry(
        &self,
        ttl_seconds: Option<i64>,
        expires_at: Option<i64>,
        now: Timestamp,
    ) -> Result<Timestamp, SessionError> {
        let max_ttl = self.policy.max_ttl_secs;

        match (ttl_seconds, expires_at) {
            (Some(_), Some(_)) => Err(SessionError::validation(
                "expiresAt",
                "ttlSeconds and expiresAt are mutually exclusive",
            )),
            (Some(ttl), None) => {
                if ttl < 1 || ttl as u64 > max_ttl {
                    return Err(ValidationError::out_of_range(
                        "ttlSeconds",
                        1,
                        max_ttl,
                        ttl.max(0) as u64,
                    )
                    .into());
                }
                Ok(now.plus_secs(ttl as u64))
            }
            (None, Some(at)) => {
                let expires_at = Timestamp::from_unix_secs(at).ok_or_else(|| {
                    SessionError::validation("expiresAt", "is not a representable time")
                })?;
                if !expires_at.is_after(&now) {
                    return Err(ValidationError::invalid_format(
                        "expiresAt",
                        "must be strictly in the future",
                    )
                    .into());
                }
                if expires_at.duration_since(&now).num_seconds() as u64 > max_ttl {
                    return Err(SessionError::validation(
                        "expiresAt",
                        format!("must be at most {} seconds in the future", max_ttl),
                    ));
                }
                Ok(expires_at)
            }
            (None, None) => Ok(now.plus_secs(self.policy.default_ttl_secs)),
        }
    }
}
