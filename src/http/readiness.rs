//! Process readiness reporting for orchestration probes.
//!
//! Readiness is distinct from liveness: the process keeps running during a
//! drain, but reports itself unfit for new traffic so load balancers stop
//! routing to it. The flag is a single-writer, many-reader atomic cell
//! owned by the shutdown coordinator and injected into the probe router.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

/// Self-reported fitness to receive new traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessStatus {
    /// The process accepts new traffic.
    Ok,
    /// Shutdown has begun; traffic should be routed elsewhere.
    Unavailable,
}

/// Single-writer, many-reader readiness flag.
///
/// Initialized to [`ReadinessStatus::Ok`]; flipped to `Unavailable` exactly
/// once, at the start of shutdown, and never reset. Clones share the same
/// cell.
#[derive(Debug, Clone)]
pub struct Readiness {
    ready: Arc<AtomicBool>,
}

impl Readiness {
    /// Creates a flag reporting [`ReadinessStatus::Ok`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> ReadinessStatus {
        if self.ready.load(Ordering::Acquire) {
            ReadinessStatus::Ok
        } else {
            ReadinessStatus::Unavailable
        }
    }

    /// Marks the process unavailable. Idempotent; there is no path back to
    /// [`ReadinessStatus::Ok`].
    pub fn mark_unavailable(&self) {
        self.ready.store(false, Ordering::Release);
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}

/// Readiness probe response body.
#[derive(Debug, Serialize, ToSchema)]
struct ReadinessResponse {
    status: &'static str,
}

/// `GET /readiness` — Readiness probe.
#[utoipa::path(
    get,
    path = "/readiness",
    tag = "System",
    summary = "Readiness probe",
    description = "Returns 200 while the process accepts new traffic and 503 once shutdown has begun.",
    responses(
        (status = 200, description = "Process is ready"),
        (status = 503, description = "Process is draining"),
    )
)]
pub async fn probe(State(readiness): State<Readiness>) -> impl IntoResponse {
    match readiness.status() {
        ReadinessStatus::Ok => (StatusCode::OK, Json(ReadinessResponse { status: "ok" })),
        ReadinessStatus::Unavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "unavailable",
            }),
        ),
    }
}

/// Probe routes, with the readiness flag injected by reference.
pub fn routes(readiness: Readiness) -> Router {
    Router::new()
        .route("/readiness", get(probe))
        .with_state(readiness)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn starts_ok_and_flip_is_terminal() {
        let readiness = Readiness::new();
        assert_eq!(readiness.status(), ReadinessStatus::Ok);

        readiness.mark_unavailable();
        assert_eq!(readiness.status(), ReadinessStatus::Unavailable);

        // Idempotent; never reverts.
        readiness.mark_unavailable();
        assert_eq!(readiness.status(), ReadinessStatus::Unavailable);
    }

    #[test]
    fn clones_share_the_same_cell() {
        let readiness = Readiness::new();
        let observer = readiness.clone();

        readiness.mark_unavailable();
        assert_eq!(observer.status(), ReadinessStatus::Unavailable);
    }

    #[tokio::test]
    async fn probe_reports_200_then_503() {
        let readiness = Readiness::new();
        let app = routes(readiness.clone());

        let Ok(request) = Request::builder().uri("/readiness").body(Body::empty()) else {
            panic!("request build failed");
        };
        let Ok(response) = app.clone().oneshot(request).await else {
            panic!("probe request failed");
        };
        assert_eq!(response.status(), StatusCode::OK);
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), 1024).await else {
            panic!("body read failed");
        };
        let Ok(body) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
            panic!("probe body is not JSON");
        };
        assert_eq!(body, serde_json::json!({ "status": "ok" }));

        readiness.mark_unavailable();
        let Ok(request) = Request::builder().uri("/readiness").body(Body::empty()) else {
            panic!("request build failed");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("probe request failed");
        };
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
