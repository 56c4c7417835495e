//! HTTP handlers for session endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::application::handlers::session::{
    CreateSessionHandler, DeleteUserSessionsCommand, DeleteUserSessionsHandler,
    GetSessionHandler, GetSessionQuery,
};
use crate::domain::session::SessionError;

use super::dto::{
    CreateSessionRequest, DeleteSessionsResponse, ErrorResponse, SessionLookupParams,
    SessionResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct SessionHandlers {
    get_handler: Arc<GetSessionHandler>,
    create_handler: Arc<CreateSessionHandler>,
    delete_handler: Arc<DeleteUserSessionsHandler>,
}

impl SessionHandlers {
    pub fn new(
        get_handler: Arc<GetSessionHandler>,
        create_handler: Arc<CreateSessionHandler>,
        delete_handler: Arc<DeleteUserSessionsHandler>,
    ) -> Self {
        Self {
            get_handler,
            create_handler,
            delete_handler,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /sessions - Create a new session
pub async fn create_session(
    State(handlers): State<SessionHandlers>,
    body: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected create session body");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request(rejection.body_text())),
            )
                .into_response();
        }
    };

    match handlers.create_handler.handle(req.into()).await {
        Ok(session) => {
            let response: SessionResponse = session.into();
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => handle_session_error(e),
    }
}

/// GET /sessions/:id - Get a session by id
pub async fn get_session(
    State(handlers): State<SessionHandlers>,
    Path(session_id): Path<String>,
) -> Response {
    fetch_session(&handlers, session_id).await
}

/// GET /sessions?id= - Get a session by query parameter or bearer token
pub async fn lookup_session(
    State(handlers): State<SessionHandlers>,
    Query(params): Query<SessionLookupParams>,
    headers: HeaderMap,
) -> Response {
    let session_id = params
        .id
        .filter(|id| !id.is_empty())
        .or_else(|| bearer_token(&headers));

    match session_id {
        Some(session_id) => fetch_session(&handlers, session_id).await,
        None => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(
                "A session id is required as a path segment, ?id= or bearer token",
            )),
        )
            .into_response(),
    }
}

/// DELETE /sessions/:username - Delete every session of a user
pub async fn delete_user_sessions(
    State(handlers): State<SessionHandlers>,
    Path(username): Path<String>,
) -> Response {
    let cmd = DeleteUserSessionsCommand { username };

    match handlers.delete_handler.handle(cmd).await {
        Ok(result) => {
            let response: DeleteSessionsResponse = result.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_session_error(e),
    }
}

async fn fetch_session(handlers: &SessionHandlers, session_id: String) -> Response {
    match handlers.get_handler.handle(GetSessionQuery { session_id }).await {
        Ok(session) => {
            let response: SessionResponse = session.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_session_error(e),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

fn handle_session_error(error: SessionError) -> Response {
    match error {
        SessionError::ValidationFailed { field, message } => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(format!(
                "Validation failed for {}: {}",
                field, message
            ))),
        )
            .into_response(),
        SessionError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_found(format!("Session not found: {}", id))),
        )
            .into_response(),
        SessionError::Conflict(id) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::conflict(format!("Session already exists: {}", id))),
        )
            .into_response(),
        SessionError::Storage(e) if e.is_transient() => {
            tracing::warn!(error = %e, "Session storage unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::service_unavailable(
                    "Session storage is temporarily unavailable",
                )),
            )
                .into_response()
        }
        SessionError::Storage(e) => {
            tracing::error!(error = %e, "Session storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal("Session storage returned invalid data")),
            )
                .into_response()
        }
        SessionError::KeyGenerationExhausted { attempts } => {
            tracing::error!(attempts, "Session id generation exhausted");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal("Could not allocate a session id")),
            )
                .into_response()
        }
    }
}
