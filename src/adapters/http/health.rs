//! Liveness endpoint backed by a session table ping.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::ports::SessionTable;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl HealthResponse {
    fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// GET /health - 200 when the session table answers, 503 otherwise
pub async fn health_check(State(table): State<Arc<dyn SessionTable>>) -> Response {
    match table.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse::new("ok"))).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse::new("unavailable")),
            )
                .into_response()
        }
    }
}

pub fn health_routes(table: Arc<dyn SessionTable>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(table)
}
