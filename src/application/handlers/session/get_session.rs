//! GetSessionHandler - Query handler for reading one live session.

use std::sync::Arc;

use crate::domain::foundation::SessionId;
use crate::domain::session::{Session, SessionError};
use crate::ports::{Clock, SessionTable};

/// Query to get a session by ID.
#[derive(Debug, Clone)]
pub struct GetSessionQuery {
    pub session_id: String,
}

/// Handler for retrieving sessions.
///
/// An item the backend has not reclaimed yet is still reported as
/// `NotFound` once the clock reaches its expiry.
pub struct GetSessionHandler {
    table: Arc<dyn SessionTable>,
    clock: Arc<dyn Clock>,
}

impl GetSessionHandler {
    pub fn new(table: Arc<dyn SessionTable>, clock: Arc<dyn Clock>) -> Self {
        Self { table, clock }
    }

    pub async fn handle(&self, query: GetSessionQuery) -> Result<Session, SessionError> {
        let session_id = SessionId::new(query.session_id)?;

        let session = self.table.get(&session_id).await?;
        let now = self.clock.now();

        match session {
            Some(session) if !session.is_expired_at(&now) => Ok(session),
            Some(_) => {
                tracing::debug!(session_id = %session_id, "Session expired but not yet reclaimed");
                Err(SessionError::not_found(session_id))
            }
            None => Err(SessionError::not_found(session_id)),
        }
    }
}
