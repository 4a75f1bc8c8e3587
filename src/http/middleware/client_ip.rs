//! Client-address normalization.
//!
//! Resolves the real client address from proxy headers before anything
//! logs it, falling back to the socket peer when no proxy is involved.
//! `X-Forwarded-For` lists hops client-first, so the first entry wins.

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Request};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

/// Normalized client address, recorded as a request extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(
    /// The resolved address.
    pub IpAddr,
);

/// Middleware: records the normalized client address on the request.
pub async fn normalize(mut req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    if let Some(ip) = from_headers(req.headers()).or(peer) {
        req.extensions_mut().insert(ClientIp(ip));
    }
    next.run(req).await
}

/// Extracts the client address from `X-Forwarded-For` or `X-Real-IP`.
fn from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok())
        && let Some(first) = forwarded.split(',').next()
        && let Ok(ip) = first.trim().parse()
    {
        return Some(ip);
    }
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| raw.trim().parse().ok())
}
