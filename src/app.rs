//! Wiring of ports, handlers and routes into a servable application.

use std::sync::Arc;

use axum::Router;

use crate::adapters::http::{api_router, SessionHandlers};
use crate::adapters::TimeoutSessionTable;
use crate::application::{
    CreateSessionHandler, DeleteUserSessionsHandler, GetSessionHandler, SessionPolicy,
};
use crate::config::AppConfig;
use crate::ports::{Clock, SessionIdGenerator, SessionTable};

/// Everything the handlers depend on.
#[derive(Clone)]
pub struct AppDependencies {
    pub table: Arc<dyn SessionTable>,
    pub clock: Arc<dyn Clock>,
    pub id_generator: Arc<dyn SessionIdGenerator>,
}

/// Builds the HTTP application over `deps`.
///
/// The table is wrapped so every storage call is bounded by
/// `storage.timeout_ms`.
pub fn build_router(deps: AppDependencies, config: &AppConfig) -> Router {
    let table: Arc<dyn SessionTable> = Arc::new(TimeoutSessionTable::new(
        deps.table,
        config.storage.timeout(),
    ));

    let handlers = SessionHandlers::new(
        Arc::new(GetSessionHandler::new(table.clone(), deps.clock.clone())),
        Arc::new(CreateSessionHandler::new(
            table.clone(),
            deps.clock.clone(),
            deps.id_generator,
            SessionPolicy::from(&config.sessions),
        )),
        Arc::new(DeleteUserSessionsHandler::from_config(
            table.clone(),
            deps.clock,
            &config.sessions,
        )),
    );

    api_router(handlers, table, &config.server)
}
