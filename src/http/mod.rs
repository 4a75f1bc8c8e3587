//! HTTP layer: middleware pipeline, probe routes, and router assembly.
//!
//! The pipeline order is load-bearing and declared in exactly one place,
//! [`pipeline`]. [`build_app`] mounts the probe, the versioned API, and
//! the static docs directory underneath it.

pub mod middleware;
pub mod pipeline;
pub mod readiness;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::from_fn;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;

use crate::article::ArticleStore;
use crate::config::AppConfig;
use crate::http::pipeline::Pipeline;
use crate::http::readiness::Readiness;

/// Builds the middleware pipeline in its required order.
///
/// Order matters: the request id must exist before the logger reads it,
/// the client address must be normalized before the logger records it,
/// recovery must sit inside the logger so the logger sees the substituted
/// failure status, and version negotiation runs last, just before
/// dispatch.
#[must_use]
pub fn pipeline(config: &AppConfig) -> Pipeline {
    let cors = cors_layer(config);
    Pipeline::new()
        .stage("request-id", |router| {
            // ServiceBuilder applies top-down: assignment wraps propagation.
            router.layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
        })
        .stage("client-ip", |router| {
            router.layer(from_fn(middleware::client_ip::normalize))
        })
        .stage("request-log", |router| {
            router.layer(from_fn(middleware::request_log::record))
        })
        .stage("recover", |router| router.layer(CatchPanicLayer::new()))
        .stage("cors", move |router| router.layer(cors))
        .stage("api-version", |router| {
            router.layer(from_fn(middleware::version::negotiate))
        })
}

/// Builds the complete application handler: all mounts wrapped by the
/// full middleware pipeline.
#[must_use]
pub fn build_app(config: &AppConfig, readiness: Readiness, articles: ArticleStore) -> Router {
    let routes = Router::new()
        .merge(readiness::routes(readiness))
        .nest("/1.0", crate::article::routes(articles))
        .nest_service("/docs", ServeDir::new(config.docs_dir.clone()));
    pipeline(config).wrap(routes)
}

/// Cross-origin policy from configuration.
///
/// An empty origin list mirrors the request origin, which keeps
/// credentialed requests valid (a literal wildcard may not be combined
/// with credentials).
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(origins)
    };

    let allowed: Vec<HeaderName> = config
        .allowed_headers
        .iter()
        .filter_map(|header| header.parse().ok())
        .collect();
    let exposed: Vec<HeaderName> = config
        .exposed_headers
        .iter()
        .filter_map(|header| header.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(allowed)
        .expose_headers(exposed)
        .allow_credentials(true)
}
