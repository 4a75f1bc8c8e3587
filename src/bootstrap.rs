//! Service bootstrap: strictly ordered startup and signal-driven teardown.
//!
//! Startup order, short-circuiting on the first failure: connection
//! established → migrations applied → pipeline assembled → listener bound
//! → shutdown coordinator armed concurrently with serving. Every failure
//! before the listener is bound is fatal; no request is ever served from
//! an unmigrated or disconnected store.

use std::net::SocketAddr;
use std::time::Duration;

use crate::article;
use crate::config::AppConfig;
use crate::db::migrate::{self, MigrationSet, PgMigrationStore};
use crate::db::{Database, PoolSettings};
use crate::error::ServiceError;
use crate::http;
use crate::http::readiness::Readiness;
use crate::shutdown::{ShutdownCoordinator, SignalListener};

/// Migrations from every feature area, in cross-area declaration order.
///
/// This is the single aggregation point: areas declare their own steps,
/// and only the order established here is authoritative.
fn migrations() -> MigrationSet {
    MigrationSet::new().extend(article::migrations())
}

/// Runs the service until a termination signal has been handled and the
/// server has drained.
///
/// # Errors
///
/// Returns [`ServiceError::Connection`] or [`ServiceError::Migration`] if
/// the store cannot be prepared, and [`ServiceError::Server`] if the
/// listener cannot be bound or the server fails while serving. A failure
/// during the drain itself is logged and swallowed; the process exits via
/// normal fall-through.
pub async fn run(config: AppConfig) -> Result<(), ServiceError> {
    let settings = PoolSettings {
        max_conn_lifetime: Duration::from_secs(config.database_max_conn_lifetime_secs),
        max_open_conns: config.database_max_open_conns,
        max_idle_conns: config.database_max_idle_conns,
    };
    let db = Database::connect(&config.database_url, &settings).await?;
    tracing::info!("database connected");

    let mut store = PgMigrationStore::new(db.pool().clone());
    let applied = migrate::run(&mut store, &migrations()).await?;
    tracing::info!(applied, "migrations up to date");

    let readiness = Readiness::new();
    let coordinator = ShutdownCoordinator::new(readiness.clone());
    let signals = SignalListener::install()?;

    let articles = article::ArticleStore::new(db.pool().clone());
    let app = http::build_app(&config, readiness, articles);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .map_err(ServiceError::Server)?;
    tracing::info!(addr = %config.listen_addr, "http service listening");

    let drain = {
        let coordinator = coordinator.clone();
        async move { coordinator.drain_after(signals.recv()).await }
    };
    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(drain)
    .await;

    if let Err(error) = served {
        if coordinator.is_draining() {
            let error = ServiceError::Shutdown(error.to_string());
            tracing::error!(%error, "could not drain server cleanly");
        } else {
            return Err(ServiceError::Server(error));
        }
    }

    coordinator.finish();
    db.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}
