//! Session store HTTP server.

use std::error::Error;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use session_store::adapters::{
    spawn_expiry_reaper, InMemorySessionTable, PostgresSessionTable, RandomSessionIdGenerator,
    RedisSessionTable, SystemClock,
};
use session_store::config::{AppConfig, LogFormat, ServerConfig, StorageBackend};
use session_store::ports::{Clock, SessionTable};
use session_store::{build_router, AppDependencies};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut reaper = None;

    let table: Arc<dyn SessionTable> = match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory session table; sessions are lost on restart");
            Arc::new(InMemorySessionTable::new())
        }
        StorageBackend::Redis => Arc::new(RedisSessionTable::connect(&config.storage.redis).await?),
        StorageBackend::Postgres => {
            let database = &config.storage.database;
            let table = PostgresSessionTable::connect(database).await?;
            reaper = Some(spawn_expiry_reaper(
                table.clone(),
                clock.clone(),
                database.reap_interval(),
            ));
            Arc::new(table)
        }
    };

    let app = build_router(
        AppDependencies {
            table,
            clock,
            id_generator: Arc::new(RandomSessionIdGenerator),
        },
        &config,
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        backend = ?config.storage.backend,
        environment = ?config.server.environment,
        "Session store listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(reaper) = reaper {
        reaper.abort();
    }
    tracing::info!("Session store stopped");

    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    match server.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight requests");
}
