use crate::tests::free_port;
use crate::{ReadinessGate, SupervisorError};

use std::time::Duration;

use googletest::assert_that;
use googletest::prelude::{anything, eq, ok};

#[tokio::test]
async fn given_listener_when_wait_until_up_then_ok() {
    // Given
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();

    // When
    let result = ReadinessGate::wait_until_up(
        "127.0.0.1",
        port,
        Duration::from_millis(20),
        Duration::from_secs(2),
    )
    .await;

    // Then
    assert_that!(result, ok(anything()));
}

#[tokio::test]
async fn given_listener_appears_later_when_wait_until_up_then_ok() {
    // Given
    let port = free_port();
    let server = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        tokio::net::TcpListener::bind(("127.0.0.1", port)).await.unwrap()
    });

    // When
    let result = ReadinessGate::wait_until_up(
        "127.0.0.1",
        port,
        Duration::from_millis(20),
        Duration::from_secs(3),
    )
    .await;

    // Then
    assert_that!(result, ok(anything()));
    drop(server.await.unwrap());
}

#[tokio::test]
async fn given_nothing_listening_when_wait_until_up_then_readiness_timeout() {
    // Given
    let port = free_port();

    // When
    let result = ReadinessGate::wait_until_up(
        "127.0.0.1",
        port,
        Duration::from_millis(20),
        Duration::from_millis(150),
    )
    .await;

    // Then
    match result {
        Err(SupervisorError::ReadinessTimeout {
            port: failed,
            timeout_ms,
            ..
        }) => {
            assert_that!(failed, eq(port));
            assert_that!(timeout_ms, eq(150_u64));
        }
        other => panic!("expected ReadinessTimeout, got {other:?}"),
    }
}
