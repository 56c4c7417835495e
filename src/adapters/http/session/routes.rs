//! HTTP routes for session endpoints.

use axum::{routing::get, Router};

use super::handlers::{
    create_session, delete_user_sessions, get_session, lookup_session, SessionHandlers,
};

/// Creates the session router with all endpoints.
///
/// `/:key` is a session id for `GET` and a username for `DELETE`.
pub fn session_routes(handlers: SessionHandlers) -> Router {
    Router::new()
        .route("/", get(lookup_session).post(create_session))
        .route("/:key", get(get_session).delete(delete_user_sessions))
        .with_state(handlers)
}
