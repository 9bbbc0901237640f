// tests/integration/shutdown_test.rs

//! Graceful shutdown: in-flight requests finish before `stop` returns.

use super::test_helpers::{TestClient, start, test_server};
use agentd::core::handler::{blocking_fn, handler_fn};
use agentd::core::protocol::Response;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::Notify;

#[tokio::test]
async fn test_stop_waits_for_in_flight_request() {
    let started = Arc::new(Notify::new());
    let mut server = test_server();
    let signal = started.clone();
    server.register(
        "Slow",
        handler_fn(move |params: Value| {
            let signal = signal.clone();
            async move {
                signal.notify_one();
                tokio::time::sleep(Duration::from_millis(300)).await;
                Ok(params)
            }
        }),
    );
    let handle = start(server).await;
    let mut client = TestClient::connect(handle.local_addr()).await;

    client.send(11, "Slow", json!("done")).await;
    started.notified().await;

    let begun = Instant::now();
    handle.stop().await;
    assert!(
        begun.elapsed() >= Duration::from_millis(200),
        "stop returned before the in-flight request finished"
    );

    assert_eq!(client.recv().await, Response::success(11, json!("done")));
    assert!(client.is_closed_by_server().await);
}

#[tokio::test]
async fn test_stop_waits_for_blocking_handler() {
    let started = Arc::new(Notify::new());
    let mut server = test_server();
    let signal = started.clone();
    server.register(
        "Crunch",
        blocking_fn(move |_| {
            signal.notify_one();
            std::thread::sleep(Duration::from_millis(250));
            Ok(json!(42))
        }),
    );
    let handle = start(server).await;
    let mut client = TestClient::connect(handle.local_addr()).await;

    client.send(1, "Crunch", Value::Null).await;
    started.notified().await;
    handle.stop().await;

    assert_eq!(client.recv().await, Response::success(1, json!(42)));
}

#[tokio::test]
async fn test_stop_closes_idle_connections() {
    let mut server = test_server();
    server.register("Echo", handler_fn(|params| async move { Ok(params) }));
    let handle = start(server).await;
    let mut client = TestClient::connect(handle.local_addr()).await;
    assert_eq!(client.call(1, "Echo", json!(1)).await.id, 1);

    let stats = handle.stats().clone();
    tokio::time::timeout(Duration::from_secs(5), handle.stop())
        .await
        .expect("stop hung on an idle connection");

    assert!(client.is_closed_by_server().await);
    assert_eq!(stats.get_active_connections(), 0);
}

#[tokio::test]
async fn test_listener_is_closed_after_stop() {
    let handle = start(test_server()).await;
    let addr = handle.local_addr();
    handle.stop().await;

    assert!(TcpStream::connect(addr).await.is_err());
}
