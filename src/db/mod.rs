//! PostgreSQL access: pooled connections and schema migrations.
//!
//! [`Database`] owns the connection pool for the life of the process.
//! [`migrate`] applies the ordered, ledger-tracked schema migrations every
//! feature area declares.

pub mod migrate;
pub mod pool;

pub use pool::{Database, PoolSettings};
