// tests/integration/get_command_test.rs

//! The built-in `Get` command served over TCP from a seeded store.

use super::test_helpers::{TestClient, start, test_server};
use agentd::core::commands::register_builtin;
use agentd::core::storage::{KeyValueStore, MemoryStore};
use agentd::ServerHandle;
use serde_json::{Value, json};
use std::sync::Arc;

async fn start_with_store(store: MemoryStore) -> ServerHandle {
    let store: Arc<dyn KeyValueStore> = Arc::new(store);
    let mut server = test_server();
    register_builtin(server.registry_mut(), store);
    start(server).await
}

#[tokio::test]
async fn test_get_returns_stored_value() {
    let store = MemoryStore::new();
    store.insert("key", r#"{"a":"b"}"#);
    let handle = start_with_store(store).await;
    let mut client = TestClient::connect(handle.local_addr()).await;

    let response = client.call(3, "Get", json!("key")).await;
    assert_eq!(response.id, 3);
    assert_eq!(response.result, Some(json!({"a": "b"})));
    assert_eq!(response.error, None);

    handle.stop().await;
}

#[tokio::test]
async fn test_get_missing_key_is_an_error_response() {
    let handle = start_with_store(MemoryStore::new()).await;
    let mut client = TestClient::connect(handle.local_addr()).await;

    let response = client.call(4, "Get", json!("nope")).await;
    assert_eq!(response.id, 4);
    assert_eq!(response.result, None);
    let error = response.error.expect("missing key must produce an error");
    assert_eq!(error["code"], json!("key_not_found"));

    handle.stop().await;
}

#[tokio::test]
async fn test_get_with_invalid_params() {
    let handle = start_with_store(MemoryStore::new()).await;
    let mut client = TestClient::connect(handle.local_addr()).await;

    let response = client.call(5, "Get", Value::Null).await;
    assert_eq!(response.error.unwrap()["code"], json!("invalid_params"));

    handle.stop().await;
}

#[tokio::test]
async fn test_get_from_seed_file() {
    let dir = tempfile::tempdir().unwrap();
    let seed = dir.path().join("seed.json");
    std::fs::write(&seed, r#"{"user:1": {"name": "ada", "roles": ["admin"]}}"#).unwrap();
    let handle = start_with_store(MemoryStore::from_seed_file(&seed).unwrap()).await;
    let mut client = TestClient::connect(handle.local_addr()).await;

    let response = client.call(1, "Get", json!("user:1")).await;
    assert_eq!(
        response.result,
        Some(json!({"name": "ada", "roles": ["admin"]}))
    );

    handle.stop().await;
}

#[tokio::test]
async fn test_concurrent_clients_read_the_same_store() {
    let store = MemoryStore::new();
    for i in 0..16 {
        store.insert_json(format!("k{i}"), &json!(i)).unwrap();
    }
    let handle = start_with_store(store).await;
    let addr = handle.local_addr();

    let mut tasks = tokio::task::JoinSet::new();
    for c in 0..8u32 {
        tasks.spawn(async move {
            let mut client = TestClient::connect(addr).await;
            for i in 0..16u32 {
                let id = c * 100 + i;
                let response = client.call(id, "Get", json!(format!("k{i}"))).await;
                assert_eq!(response.id, id);
                assert_eq!(response.result, Some(json!(i)));
            }
        });
    }
    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    assert_eq!(handle.stats().snapshot().total_requests, 128);
    handle.stop().await;
}
