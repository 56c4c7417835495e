//! HTTP adapters - REST API implementations.
//!
//! - `session` - GET/POST/DELETE under `/sessions`
//! - `health` - backend reachability under `/health`
//!
//! [`api_router`] assembles both behind the shared middleware stack.

pub mod health;
pub mod session;

use std::sync::Arc;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    response::IntoResponse,
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::ports::SessionTable;

pub use health::{health_routes, HealthResponse};
pub use session::{session_routes, ErrorResponse, SessionHandlers};

/// Builds the full HTTP surface with tracing, request ids, a whole-request
/// timeout and CORS.
pub fn api_router(
    handlers: SessionHandlers,
    table: Arc<dyn SessionTable>,
    server: &ServerConfig,
) -> Router {
    Router::new()
        .nest("/sessions", session_routes(handlers))
        .merge(health_routes(table))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(server.request_timeout()))
                .layer(cors_layer(server)),
        )
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::not_found("No such route")),
    )
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return if server.is_production() {
            CorsLayer::new()
        } else {
            CorsLayer::permissive()
        };
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}
