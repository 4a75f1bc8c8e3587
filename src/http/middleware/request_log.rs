//! Structured per-request logging.
//!
//! Sits outside panic recovery in the pipeline, so a request that panics
//! downstream is still recorded with the failure status the recovery
//! stage substitutes. Reads the request id and client address assigned by
//! the stages before it.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use super::client_ip::ClientIp;

/// Middleware: emits one structured log record per completed request.
pub async fn record(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_owned();
    let client_ip = req
        .extensions()
        .get::<ClientIp>()
        .map_or_else(|| "-".to_string(), |ip| ip.0.to_string());

    let start = Instant::now();
    let response = next.run(req).await;

    tracing::info!(
        %method,
        path = %path,
        request_id = %request_id,
        client_ip = %client_ip,
        status = response.status().as_u16(),
        elapsed = ?start.elapsed(),
        "request"
    );
    response
}
