//! Pooled PostgreSQL connection handle.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::ServiceError;

/// Connection pool limits, applied before the pool serves its first query.
///
/// The pool enforces these bounds itself; callers exceeding the open bound
/// wait on the pool's own acquire policy. `max_idle_conns` maps onto the
/// pool's idle floor (`min_connections`), which together with
/// `max_open_conns` carries the idle/open limit contract.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Maximum lifetime of a single pooled connection.
    pub max_conn_lifetime: Duration,
    /// Maximum number of open connections.
    pub max_open_conns: u32,
    /// Number of idle connections kept warm.
    pub max_idle_conns: u32,
}

/// Owned handle to the PostgreSQL connection pool.
///
/// The process holds exactly one `Database` for its lifetime; clones share
/// the underlying pool. [`Database::close`] is called once at teardown.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Opens a pool against `dsn`, applies `settings`, and verifies
    /// connectivity with a ping before returning.
    ///
    /// There is no retry at this layer: an unreachable store or malformed
    /// DSN fails the call immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Connection`] if the DSN cannot be parsed or
    /// the store is unreachable.
    pub async fn connect(dsn: &str, settings: &PoolSettings) -> Result<Self, ServiceError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_open_conns)
            .min_connections(settings.max_idle_conns)
            .max_lifetime(settings.max_conn_lifetime)
            .connect(dsn)
            .await
            .map_err(ServiceError::Connection)?;

        let db = Self { pool };
        db.ping().await?;
        Ok(db)
    }

    /// Round-trips a trivial query to verify the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Connection`] if the query fails.
    pub async fn ping(&self) -> Result<(), ServiceError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(ServiceError::Connection)?;
        Ok(())
    }

    /// Shared reference to the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Closes the pool and waits for checked-out connections to be
    /// returned. Called exactly once at process teardown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
