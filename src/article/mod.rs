//! Article resource: storage, HTTP handlers, and schema migrations.
//!
//! A feature area in the bootstrap's sense: it owns its routes, its
//! storage, and the migrations that create its schema, and contributes
//! each to the corresponding aggregation point.

pub mod handlers;
pub mod store;

use crate::db::migrate::Migration;

pub use handlers::routes;
pub use store::{Article, ArticleStore};

/// Schema migrations this feature area declares, in application order.
#[must_use]
pub fn migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            "001_create_articles",
            "CREATE TABLE IF NOT EXISTS articles (\
                 id UUID PRIMARY KEY, \
                 title TEXT NOT NULL, \
                 body TEXT NOT NULL DEFAULT '', \
                 created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
                 updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
        ),
        Migration::new(
            "002_articles_created_at_idx",
            "CREATE INDEX IF NOT EXISTS articles_created_at_idx \
                 ON articles (created_at DESC)",
        ),
    ]
}
