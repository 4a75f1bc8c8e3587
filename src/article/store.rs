//! PostgreSQL-backed article storage.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;

/// A published article.
#[derive(Debug, Clone)]
pub struct Article {
    /// Unique article id.
    pub id: Uuid,
    /// Article title.
    pub title: String,
    /// Article body text.
    pub body: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modification timestamp.
    pub updated_at: DateTime<Utc>,
}

type ArticleRow = (Uuid, String, String, DateTime<Utc>, DateTime<Utc>);

impl From<ArticleRow> for Article {
    fn from((id, title, body, created_at, updated_at): ArticleRow) -> Self {
        Self {
            id,
            title,
            body,
            created_at,
            updated_at,
        }
    }
}

/// Article storage over the shared connection pool.
#[derive(Debug, Clone)]
pub struct ArticleStore {
    pool: PgPool,
}

impl ArticleStore {
    /// Creates a store over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists articles, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Database`] on storage failure.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Article>, ApiError> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            "SELECT id, title, body, created_at, updated_at FROM articles \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ApiError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    /// Fetches one article by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ArticleNotFound`] if no such article exists, or
    /// [`ApiError::Database`] on storage failure.
    pub async fn get(&self, id: Uuid) -> Result<Article, ApiError> {
        sqlx::query_as::<_, ArticleRow>(
            "SELECT id, title, body, created_at, updated_at FROM articles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ApiError::Database(e.to_string()))?
        .map(Article::from)
        .ok_or(ApiError::ArticleNotFound(id))
    }

    /// Inserts a new article and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Database`] on storage failure.
    pub async fn create(&self, title: &str, body: &str) -> Result<Article, ApiError> {
        let row = sqlx::query_as::<_, ArticleRow>(
            "INSERT INTO articles (id, title, body) VALUES ($1, $2, $3) \
             RETURNING id, title, body, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(body)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ApiError::Database(e.to_string()))?;

        Ok(Article::from(row))
    }

    /// Replaces an article's title and body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ArticleNotFound`] if no such article exists, or
    /// [`ApiError::Database`] on storage failure.
    pub async fn update(&self, id: Uuid, title: &str, body: &str) -> Result<Article, ApiError> {
        sqlx::query_as::<_, ArticleRow>(
            "UPDATE articles SET title = $2, body = $3, updated_at = now() \
             WHERE id = $1 RETURNING id, title, body, created_at, updated_at",
        )
        .bind(id)
        .bind(title)
        .bind(body)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ApiError::Database(e.to_string()))?
        .map(Article::from)
        .ok_or(ApiError::ArticleNotFound(id))
    }

    /// Deletes an article.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ArticleNotFound`] if no such article exists, or
    /// [`ApiError::Database`] on storage failure.
    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ApiError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(ApiError::ArticleNotFound(id));
        }
        Ok(())
    }
}
