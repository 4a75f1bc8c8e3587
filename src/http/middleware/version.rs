//! Path-embedded API version negotiation.
//!
//! Requests whose first path segment is version-shaped (`major.minor`)
//! are validated against the supported set before dispatch: supported
//! versions are recorded on the request and echoed in the `x-api-version`
//! response header, unsupported ones short-circuit without reaching any
//! route. Paths without a version segment pass through untouched.

use axum::extract::Request;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// API versions the router can dispatch.
const SUPPORTED: &[&str] = &["1.0"];

/// Response header carrying the negotiated version.
const VERSION_HEADER: &str = "x-api-version";

/// Negotiated API version, recorded as a request extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiVersion(
    /// The version segment, e.g. `"1.0"`.
    pub &'static str,
);

/// Middleware: validates a path-embedded API version before dispatch.
pub async fn negotiate(mut req: Request, next: Next) -> Response {
    let Some(segment) = version_segment(req.uri().path()) else {
        return next.run(req).await;
    };
    let Some(version) = SUPPORTED.iter().copied().find(|v| *v == segment) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    req.extensions_mut().insert(ApiVersion(version));
    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(VERSION_HEADER, HeaderValue::from_static(version));
    response
}

/// First path segment, when it is version-shaped (`digits.digits`).
fn version_segment(path: &str) -> Option<&str> {
    let first = path.strip_prefix('/')?.split('/').next()?;
    let (major, minor) = first.split_once('.')?;
    let numeric = !major.is_empty()
        && !minor.is_empty()
        && major.bytes().all(|b| b.is_ascii_digit())
        && minor.bytes().all(|b| b.is_ascii_digit());
    numeric.then_some(first)
}
