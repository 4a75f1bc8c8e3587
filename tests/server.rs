//! End-to-end drain behavior over a real socket.
//!
//! Boots the probe plus a deliberately slow route on an ephemeral port,
//! injects the termination signal through a channel, and checks the
//! graceful-shutdown contract: readiness answers 200 before the trigger,
//! the request already in flight completes normally, the server task
//! exits cleanly, and readiness reads unavailable afterward.

#![allow(clippy::panic)]

use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tower::ServiceExt;

use folio_api::http::readiness::{self, Readiness, ReadinessStatus};
use folio_api::shutdown::{Phase, ShutdownCoordinator, TermSignal};

#[tokio::test]
async fn drain_completes_in_flight_requests_and_flips_readiness() {
    let readiness = Readiness::new();
    let coordinator = ShutdownCoordinator::new(readiness.clone());

    let app = Router::new()
        .merge(readiness::routes(readiness.clone()))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                "done"
            }),
        );
    let probe_app = app.clone();

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("could not bind an ephemeral port");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("listener has no local address");
    };

    let (trigger, signal) = tokio::sync::oneshot::channel();
    let drain = {
        let coordinator = coordinator.clone();
        async move {
            coordinator
                .drain_after(async move { signal.await.unwrap_or(TermSignal::Terminate) })
                .await;
        }
    };
    let server = tokio::spawn(async move {
        axum::serve(listener, app).with_graceful_shutdown(drain).await
    });

    // Before any signal the probe reports ready.
    let base = format!("http://{addr}");
    let Ok(response) = reqwest::get(format!("{base}/readiness")).await else {
        panic!("readiness request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    // Start a request, then trigger shutdown while it is in flight.
    let slow = tokio::spawn(reqwest::get(format!("{base}/slow")));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(trigger.send(TermSignal::Terminate).is_ok());

    let Ok(Ok(response)) = slow.await else {
        panic!("in-flight request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let Ok(body) = response.text().await else {
        panic!("in-flight response body unreadable");
    };
    assert_eq!(body, "done");

    // The server drains cleanly and readiness never reverts.
    let Ok(Ok(())) = server.await else {
        panic!("server did not drain cleanly");
    };
    assert_eq!(readiness.status(), ReadinessStatus::Unavailable);
    assert_eq!(*coordinator.phase().borrow(), Phase::Draining);
    coordinator.finish();
    assert_eq!(*coordinator.phase().borrow(), Phase::Done);

    // A probe issued after the flip answers 503.
    let Ok(request) = axum::http::Request::builder()
        .uri("/readiness")
        .body(axum::body::Body::empty())
    else {
        panic!("request build failed");
    };
    let Ok(response) = probe_app.oneshot(request).await else {
        panic!("post-drain probe failed");
    };
    assert_eq!(response.status(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
}
