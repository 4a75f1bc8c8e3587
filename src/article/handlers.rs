//! Article CRUD handlers and DTOs.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::store::{Article, ArticleStore};
use crate::error::{ApiError, ErrorResponse};

/// Article representation returned by every endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ArticleDto {
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

impl From<Article> for ArticleDto {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            title: article.title,
            body: article.body,
            created_at: article.created_at,
            updated_at: article.updated_at,
        }
    }
}

/// Payload for creating or replacing an article.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ArticlePayload {
    /// Article title; must not be empty.
    pub title: String,
    /// Article body text.
    #[serde(default)]
    pub body: String,
}

impl ArticlePayload {
    fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::InvalidRequest("title must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Pagination query parameters for the list endpoint.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl PaginationParams {
    /// Clamps `page` and `per_page` to their allowed ranges.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 100),
        }
    }
}

/// `GET /articles` — List articles, newest first.
///
/// # Errors
///
/// Returns [`ApiError`] on storage failure.
#[utoipa::path(
    get,
    path = "/1.0/articles",
    tag = "Articles",
    summary = "List articles",
    params(PaginationParams),
    responses(
        (status = 200, description = "Article page", body = Vec<ArticleDto>),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn list_articles(
    State(store): State<ArticleStore>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let params = params.clamped();
    let limit = i64::from(params.per_page);
    let offset = i64::from(params.page - 1) * limit;

    let articles = store.list(limit, offset).await?;
    let data: Vec<ArticleDto> = articles.into_iter().map(ArticleDto::from).collect();
    Ok(Json(data))
}

/// `GET /articles/{id}` — Fetch one article.
///
/// # Errors
///
/// Returns [`ApiError`] if the article does not exist or storage fails.
#[utoipa::path(
    get,
    path = "/1.0/articles/{id}",
    tag = "Articles",
    summary = "Get an article",
    params(
        ("id" = Uuid, Path, description = "Article id"),
    ),
    responses(
        (status = 200, description = "The article", body = ArticleDto),
        (status = 404, description = "No such article", body = ErrorResponse),
    )
)]
pub async fn get_article(
    State(store): State<ArticleStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let article = store.get(id).await?;
    Ok(Json(ArticleDto::from(article)))
}

/// `POST /articles` — Create an article.
///
/// # Errors
///
/// Returns [`ApiError`] on an empty title or storage failure.
#[utoipa::path(
    post,
    path = "/1.0/articles",
    tag = "Articles",
    summary = "Create an article",
    request_body = ArticlePayload,
    responses(
        (status = 201, description = "Article created", body = ArticleDto),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
    )
)]
pub async fn create_article(
    State(store): State<ArticleStore>,
    Json(payload): Json<ArticlePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let article = store.create(&payload.title, &payload.body).await?;
    Ok((StatusCode::CREATED, Json(ArticleDto::from(article))))
}

/// `PUT /articles/{id}` — Replace an article.
///
/// # Errors
///
/// Returns [`ApiError`] on an empty title, a missing article, or storage
/// failure.
#[utoipa::path(
    put,
    path = "/1.0/articles/{id}",
    tag = "Articles",
    summary = "Replace an article",
    params(
        ("id" = Uuid, Path, description = "Article id"),
    ),
    request_body = ArticlePayload,
    responses(
        (status = 200, description = "Article replaced", body = ArticleDto),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 404, description = "No such article", body = ErrorResponse),
    )
)]
pub async fn update_article(
    State(store): State<ArticleStore>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ArticlePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let article = store.update(id, &payload.title, &payload.body).await?;
    Ok(Json(ArticleDto::from(article)))
}

/// `DELETE /articles/{id}` — Delete an article.
///
/// # Errors
///
/// Returns [`ApiError`] if the article does not exist or storage fails.
#[utoipa::path(
    delete,
    path = "/1.0/articles/{id}",
    tag = "Articles",
    summary = "Delete an article",
    params(
        ("id" = Uuid, Path, description = "Article id"),
    ),
    responses(
        (status = 204, description = "Article deleted"),
        (status = 404, description = "No such article", body = ErrorResponse),
    )
)]
pub async fn delete_article(
    State(store): State<ArticleStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Article routes, with the store injected by value.
pub fn routes(store: ArticleStore) -> Router {
    Router::new()
        .route("/articles", get(list_articles).post(create_article))
        .route(
            "/articles/{id}",
            get(get_article).put(update_article).delete(delete_article),
        )
        .with_state(store)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        let params = PaginationParams { page: 0, per_page: 500 };
        let clamped = params.clamped();
        assert_eq!(clamped.page, 1);
        assert_eq!(clamped.per_page, 100);
    }

    #[test]
    fn empty_titles_are_rejected() {
        let payload = ArticlePayload {
            title: "   ".to_string(),
            body: String::new(),
        };
        assert!(payload.validate().is_err());

        let payload = ArticlePayload {
            title: "A title".to_string(),
            body: String::new(),
        };
        assert!(payload.validate().is_ok());
    }
}
