//! Ordered middleware composition.
//!
//! The middleware chain is declared once as an explicit list of named
//! stages rather than nested call-stack wiring, so the order is
//! inspectable and testable independently of the HTTP transport.
//! Declaration order is execution order: the first stage sees the request
//! first and the response last.

use std::fmt;

use axum::Router;

/// A named middleware stage.
///
/// A stage wraps a handler with one interceptor, which may inspect or
/// decorate the request, short-circuit with its own response, or delegate
/// to the next stage. Stages only assume the wrap-a-router capability,
/// never a concrete handler type.
pub struct Stage {
    name: &'static str,
    wrap: Box<dyn FnOnce(Router) -> Router + Send>,
}

impl Stage {
    /// Creates a stage from a router-wrapping closure.
    #[must_use]
    pub fn new(name: &'static str, wrap: impl FnOnce(Router) -> Router + Send + 'static) -> Self {
        Self {
            name,
            wrap: Box::new(wrap),
        }
    }

    /// Stage name, for inspection and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered middleware chain.
///
/// Insertion order defines execution order, outermost first; reordering
/// stages changes observable behavior (a request id must exist before the
/// logger reads it).
#[derive(Debug, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage. Earlier stages run closer to the wire.
    #[must_use]
    pub fn stage(
        mut self,
        name: &'static str,
        wrap: impl FnOnce(Router) -> Router + Send + 'static,
    ) -> Self {
        self.stages.push(Stage::new(name, wrap));
        self
    }

    /// Stage names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Stage::name).collect()
    }

    /// Composes every stage around `router`.
    ///
    /// `Router::layer` makes the last-added layer the outermost, so stages
    /// are applied in reverse declaration order; the first-declared stage
    /// ends up outermost.
    #[must_use]
    pub fn wrap(self, router: Router) -> Router {
        self.stages
            .into_iter()
            .rev()
            .fold(router, |router, stage| (stage.wrap)(router))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::StatusCode;
    use axum::middleware::{Next, from_fn};
    use axum::response::Response;
    use axum::routing::get;
    use tower::ServiceExt;

    fn recording_stage(name: &'static str, seen: Arc<Mutex<Vec<&'static str>>>) -> Stage {
        Stage::new(name, move |router| {
            router.layer(from_fn(move |req: Request, next: Next| {
                let seen = Arc::clone(&seen);
                async move {
                    if let Ok(mut order) = seen.lock() {
                        order.push(name);
                    }
                    next.run(req).await
                }
            }))
        })
    }

    #[test]
    fn names_follow_declaration_order() {
        let pipeline = Pipeline::new()
            .stage("outer", |router| router)
            .stage("middle", |router| router)
            .stage("inner", |router| router);

        assert_eq!(pipeline.names(), vec!["outer", "middle", "inner"]);
    }

    #[tokio::test]
    async fn first_declared_stage_sees_the_request_first() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        for name in ["outer", "middle", "inner"] {
            pipeline.stages.push(recording_stage(name, Arc::clone(&seen)));
        }

        let app = pipeline.wrap(Router::new().route("/", get(|| async { "ok" })));
        let Ok(request) = Request::builder().uri("/").body(Body::empty()) else {
            panic!("request build failed");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::OK);

        let Ok(order) = seen.lock() else {
            panic!("poisoned lock");
        };
        assert_eq!(*order, vec!["outer", "middle", "inner"]);
    }

    #[tokio::test]
    async fn stage_can_short_circuit_before_the_router() {
        let reached = Arc::new(Mutex::new(false));
        let marker = Arc::clone(&reached);

        let pipeline = Pipeline::new().stage("gate", |router| {
            router.layer(from_fn(|_req: Request, _next: Next| async {
                Response::builder()
                    .status(StatusCode::FORBIDDEN)
                    .body(Body::empty())
                    .unwrap_or_default()
            }))
        });

        let app = pipeline.wrap(Router::new().route(
            "/",
            get(move || async move {
                if let Ok(mut hit) = marker.lock() {
                    *hit = true;
                }
                "ok"
            }),
        ));

        let Ok(request) = Request::builder().uri("/").body(Body::empty()) else {
            panic!("request build failed");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let Ok(hit) = reached.lock() else {
            panic!("poisoned lock");
        };
        assert!(!*hit);
    }
}
