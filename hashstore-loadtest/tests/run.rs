//! Blackbox tests for full runs with many virtual users.

use std::time::Duration;

use hashstore_loadtest::case::default_cases;
use hashstore_loadtest::http::HttpRemote;
use hashstore_loadtest::{Operation, UserBehavior};
use hashstore_test::server::MockServer;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

fn behavior() -> UserBehavior {
    UserBehavior::builder(default_cases())
        .wait_time(Duration::ZERO, Duration::from_millis(10))
        .seed(99)
        .build()
        .unwrap()
}

#[tokio::test]
async fn conforming_service_has_no_failures() {
    hashstore_test::tracing::init();
    let server = MockServer::new(|path| {
        let cases = default_cases();
        Operation::ALL
            .into_iter()
            .flat_map(|op| cases.iter().map(move |case| (op, case)))
            .find(|(op, case)| op.path(&case.pid) == path)
            .map(|(op, case)| case.expected(op))
            .unwrap_or(StatusCode::IM_A_TEAPOT)
    })
    .await;
    let remote = HttpRemote::new(&server.host()).unwrap();

    let stats = hashstore_loadtest::run(
        remote,
        behavior(),
        4,
        Duration::from_secs(1),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(stats.total().requests() > 0);
    assert!(!stats.has_failures());

    let requested = server.requests();
    for (path, path_stats) in stats.requests() {
        assert!(requested.iter().any(|r| r == path), "{path} never requested");
        assert_eq!(path_stats.failures(), 0);
    }
}

#[tokio::test]
async fn failing_service_is_reported() {
    let server = MockServer::with_status(StatusCode::INTERNAL_SERVER_ERROR).await;
    let remote = HttpRemote::new(&server.host()).unwrap();

    let stats = hashstore_loadtest::run(
        remote,
        behavior(),
        2,
        Duration::from_millis(500),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(stats.has_failures());
    assert_eq!(stats.total().successes(), 0);
    for (_path, message, count) in stats.failures() {
        assert!(count > 0);
        assert!(message.ends_with("but got 500"), "{message}");
    }
}

#[tokio::test]
async fn overlong_duration_is_an_error() {
    let server = MockServer::with_status(StatusCode::OK).await;
    let remote = HttpRemote::new(&server.host()).unwrap();
    let duration = humantime::parse_duration("500000000000years").unwrap();

    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let result = hashstore_loadtest::run(remote, behavior(), 1, duration, shutdown).await;

    let err = result.expect_err("run accepted a duration past the end of time");
    assert!(err.to_string().contains("too long"), "{err}");
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn shutdown_ends_run_early() {
    let server = MockServer::with_status(StatusCode::OK).await;
    let remote = HttpRemote::new(&server.host()).unwrap();

    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let run = hashstore_loadtest::run(
        remote,
        behavior(),
        3,
        Duration::from_secs(3600),
        shutdown,
    );
    let stats = tokio::time::timeout(Duration::from_secs(10), run)
        .await
        .expect("run did not stop on shutdown")
        .unwrap();

    assert_eq!(stats.total().requests(), 0);
}
