//! Error taxonomies for the process lifecycle and the request path.
//!
//! [`ServiceError`] covers everything that can go wrong between process
//! start and process exit; every bootstrap-phase variant is fatal.
//! [`ApiError`] is the request-scoped error type, mapping each variant to
//! an HTTP status code and a structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::migrate::MigrationError;

/// Process-level error taxonomy.
///
/// Bootstrap errors (`Config`, `Connection`, `Migration`, `Server` before
/// serving) abort the process without serving a request. `Shutdown` is only
/// produced on the drain path and is logged, never escalated.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Required configuration is missing or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The database was unreachable or the DSN invalid at connect time.
    #[error("database connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    /// A schema migration could not be applied.
    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// The listener failed to bind, or the server closed unexpectedly.
    #[error("server error: {0}")]
    Server(#[source] std::io::Error),

    /// The server drain did not complete cleanly.
    #[error("shutdown did not complete cleanly: {0}")]
    Shutdown(String),
}

/// Structured JSON error response body.
///
/// All API error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "article not found: ...",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Request-scoped error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status               |
/// |-----------|-----------------|---------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request           |
/// | 2000–2999 | Not Found       | 404 Not Found             |
/// | 3000–3999 | Server/Storage  | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No article with the given ID exists.
    #[error("article not found: {0}")]
    ArticleNotFound(uuid::Uuid),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Underlying storage failure.
    #[error("storage error: {0}")]
    Database(String),
}

impl ApiError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::ArticleNotFound(_) => 2001,
            Self::Database(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::ArticleNotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
