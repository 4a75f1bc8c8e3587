//! Ordered, ledger-tracked schema migrations.
//!
//! Each feature area declares its migrations in code; the bootstrap
//! collects them into a single [`MigrationSet`] so cross-area ordering is
//! fixed in one place. The runner records every applied migration in the
//! `schema_migrations` ledger table and skips recorded ids on restart,
//! making [`run`] idempotent. Migrations are never reverted.

use std::collections::HashSet;
use std::future::Future;

use sqlx::PgPool;

/// A single named schema change.
///
/// Declaration order across a [`MigrationSet`] is execution order; ids are
/// never sorted.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    id: &'static str,
    sql: &'static str,
}

impl Migration {
    /// Creates a migration from a unique id and its SQL.
    #[must_use]
    pub const fn new(id: &'static str, sql: &'static str) -> Self {
        Self { id, sql }
    }

    /// Unique migration id recorded in the ledger.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        self.id
    }

    /// SQL executed when the migration is applied.
    #[must_use]
    pub const fn sql(&self) -> &'static str {
        self.sql
    }
}

/// Ordered collection of migrations from every feature area.
///
/// Built once at bootstrap; the collection order is the execution order.
#[derive(Debug, Default)]
pub struct MigrationSet {
    migrations: Vec<Migration>,
}

impl MigrationSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a feature area's migrations, preserving declaration order.
    #[must_use]
    pub fn extend(mut self, migrations: impl IntoIterator<Item = Migration>) -> Self {
        self.migrations.extend(migrations);
        self
    }

    /// Migration ids in execution order.
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.migrations.iter().map(Migration::id)
    }

    /// Number of declared migrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    /// `true` if no migrations are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.migrations.iter()
    }
}

/// Migration failure taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// The ledger could not be created or read.
    #[error("migration ledger unavailable: {0}")]
    Ledger(String),

    /// Two migrations share an id.
    #[error("duplicate migration id: {0}")]
    DuplicateId(String),

    /// A migration's apply step failed; migrations after it were not
    /// attempted.
    #[error("migration {id} failed: {reason}")]
    Failed {
        /// Id of the failing migration.
        id: String,
        /// Underlying failure description.
        reason: String,
    },
}

/// Storage the runner executes against.
///
/// Separating the ledger operations from the ordering logic keeps the
/// runner testable without a live database. The contract for [`apply`]:
/// the migration's effects and its ledger entry become durable together,
/// or not at all.
///
/// [`apply`]: MigrationStore::apply
pub trait MigrationStore {
    /// Ids already recorded in the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Ledger`] if the ledger cannot be read.
    fn applied(&mut self) -> impl Future<Output = Result<HashSet<String>, MigrationError>> + Send;

    /// Applies one migration and records its ledger entry in a single unit
    /// of work.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Failed`] carrying the migration's id if
    /// the apply step fails; in that case neither the migration's effects
    /// nor its ledger entry may be durable.
    fn apply(
        &mut self,
        migration: &Migration,
    ) -> impl Future<Output = Result<(), MigrationError>>;
}

/// Applies every migration not yet in the ledger, in declaration order.
///
/// Returns the number of migrations applied; a second run over the same
/// set and store applies zero. Stops at the first failing migration, so
/// everything before it stays recorded and nothing after it is attempted.
///
/// # Errors
///
/// Returns [`MigrationError::DuplicateId`] if two migrations share an id,
/// [`MigrationError::Ledger`] if the ledger is unavailable, or
/// [`MigrationError::Failed`] carrying the id of the failing migration.
pub async fn run<S: MigrationStore>(
    store: &mut S,
    set: &MigrationSet,
) -> Result<usize, MigrationError> {
    let mut seen = HashSet::new();
    for id in set.ids() {
        if !seen.insert(id) {
            return Err(MigrationError::DuplicateId(id.to_string()));
        }
    }

    let applied = store.applied().await?;
    let mut count = 0;
    for migration in set.iter() {
        if applied.contains(migration.id()) {
            continue;
        }
        store.apply(migration).await?;
        tracing::info!(id = migration.id(), "applied migration");
        count += 1;
    }
    Ok(count)
}

/// Ledger-backed migration store over PostgreSQL.
///
/// Sole owner of the `schema_migrations` table: one row per applied
/// migration, append-only.
#[derive(Debug)]
pub struct PgMigrationStore {
    pool: PgPool,
}

const LEDGER_DDL: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (\
     id TEXT PRIMARY KEY, \
     applied_at TIMESTAMPTZ NOT NULL DEFAULT now())";

impl PgMigrationStore {
    /// Creates a store over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl MigrationStore for PgMigrationStore {
    async fn applied(&mut self) -> Result<HashSet<String>, MigrationError> {
        sqlx::query(LEDGER_DDL)
            .execute(&self.pool)
            .await
            .map_err(|e| MigrationError::Ledger(e.to_string()))?;

        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM schema_migrations")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MigrationError::Ledger(e.to_string()))?;

        Ok(ids.into_iter().collect())
    }

    async fn apply(&mut self, migration: &Migration) -> Result<(), MigrationError> {
        let fail = |e: sqlx::Error| MigrationError::Failed {
            id: migration.id().to_string(),
            reason: e.to_string(),
        };

        // One transaction per migration: the ledger entry exists iff the
        // migration's effects are durable.
        let mut tx = self.pool.begin().await.map_err(fail)?;
        sqlx::raw_sql(migration.sql())
            .execute(&mut *tx)
            .await
            .map_err(fail)?;
        sqlx::query("INSERT INTO schema_migrations (id) VALUES ($1)")
            .bind(migration.id())
            .execute(&mut *tx)
            .await
            .map_err(fail)?;
        tx.commit().await.map_err(fail)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    /// In-memory store: a ledger vector plus an optional id to fail on.
    #[derive(Debug, Default)]
    struct MemoryStore {
        ledger: Vec<String>,
        fail_on: Option<&'static str>,
    }

    impl MigrationStore for MemoryStore {
        async fn applied(&mut self) -> Result<HashSet<String>, MigrationError> {
            Ok(self.ledger.iter().cloned().collect())
        }

        async fn apply(&mut self, migration: &Migration) -> Result<(), MigrationError> {
            if self.fail_on == Some(migration.id()) {
                return Err(MigrationError::Failed {
                    id: migration.id().to_string(),
                    reason: "induced failure".to_string(),
                });
            }
            self.ledger.push(migration.id().to_string());
            Ok(())
        }
    }

    fn three_steps() -> MigrationSet {
        MigrationSet::new().extend([
            Migration::new("001_first", "CREATE TABLE a (id INT)"),
            Migration::new("002_second", "CREATE TABLE b (id INT)"),
            Migration::new("003_third", "CREATE TABLE c (id INT)"),
        ])
    }

    #[tokio::test]
    async fn applies_all_pending_in_order() {
        let mut store = MemoryStore::default();
        let set = three_steps();

        let applied = run(&mut store, &set).await;
        assert!(matches!(applied, Ok(3)));
        assert_eq!(store.ledger, vec!["001_first", "002_second", "003_third"]);
    }

    #[tokio::test]
    async fn second_run_applies_nothing() {
        let mut store = MemoryStore::default();
        let set = three_steps();

        let first = run(&mut store, &set).await;
        assert!(matches!(first, Ok(3)));

        let second = run(&mut store, &three_steps()).await;
        assert!(matches!(second, Ok(0)));
        assert_eq!(store.ledger.len(), 3);
    }

    #[tokio::test]
    async fn declaration_order_wins_over_id_sort() {
        let mut store = MemoryStore::default();
        let set = MigrationSet::new().extend([
            Migration::new("900_late_id_first", "SELECT 1"),
            Migration::new("100_early_id_second", "SELECT 1"),
        ]);

        let applied = run(&mut store, &set).await;
        assert!(matches!(applied, Ok(2)));
        assert_eq!(store.ledger, vec!["900_late_id_first", "100_early_id_second"]);
    }

    #[tokio::test]
    async fn failure_keeps_prefix_and_skips_rest() {
        let mut store = MemoryStore {
            fail_on: Some("002_second"),
            ..MemoryStore::default()
        };

        let result = run(&mut store, &three_steps()).await;
        let Err(MigrationError::Failed { id, .. }) = result else {
            panic!("expected a migration failure");
        };
        assert_eq!(id, "002_second");
        // The migration before the failure stays recorded; the one after it
        // was never attempted.
        assert_eq!(store.ledger, vec!["001_first"]);
    }

    #[tokio::test]
    async fn resumes_after_failure_without_reapplying_prefix() {
        let mut store = MemoryStore {
            fail_on: Some("002_second"),
            ..MemoryStore::default()
        };
        let failed = run(&mut store, &three_steps()).await;
        assert!(failed.is_err());

        store.fail_on = None;
        let resumed = run(&mut store, &three_steps()).await;
        assert!(matches!(resumed, Ok(2)));
        assert_eq!(store.ledger, vec!["001_first", "002_second", "003_third"]);
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected_before_applying() {
        let mut store = MemoryStore::default();
        let set = MigrationSet::new().extend([
            Migration::new("001_first", "SELECT 1"),
            Migration::new("001_first", "SELECT 1"),
        ]);

        let result = run(&mut store, &set).await;
        let Err(MigrationError::DuplicateId(id)) = result else {
            panic!("expected duplicate id error");
        };
        assert_eq!(id, "001_first");
        assert!(store.ledger.is_empty());
    }

    #[tokio::test]
    async fn cross_area_aggregation_preserves_order() {
        let area_a = [
            Migration::new("a_001", "SELECT 1"),
            Migration::new("a_002", "SELECT 1"),
        ];
        let area_b = [Migration::new("b_001", "SELECT 1")];
        let set = MigrationSet::new().extend(area_a).extend(area_b);

        let ids: Vec<_> = set.ids().collect();
        assert_eq!(ids, vec!["a_001", "a_002", "b_001"]);

        let mut store = MemoryStore::default();
        let applied = run(&mut store, &set).await;
        assert!(matches!(applied, Ok(3)));
        assert_eq!(store.ledger, vec!["a_001", "a_002", "b_001"]);
    }
}
