use std::time::Duration;

use serde_json::json;

use crate::*;

#[tokio::test]
async fn list_requires_gzip() {
    let relay = spawn_relay(Duration::ZERO).await.unwrap();

    let plain = reqwest::Client::builder().no_gzip().build().unwrap();
    let resp = plain
        .get(format!("{}/list", relay.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn list_is_gzip_encoded() {
    let relay = spawn_relay(Duration::ZERO).await.unwrap();

    let plain = reqwest::Client::builder().no_gzip().build().unwrap();
    let resp = plain
        .get(format!("{}/list", relay.base))
        .header("accept-encoding", "gzip")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-encoding"], "gzip");
    let body = resp.bytes().await.unwrap();
    // gzip magic
    assert_eq!(&body[..2], &[0x1f, 0x8b]);
}

#[tokio::test]
async fn empty_registry_lists_no_nodes() {
    let relay = spawn_relay(Duration::ZERO).await.unwrap();
    let list = relay.list().await.unwrap();
    assert_eq!(list, json!({ "nodes": [] }));
}

#[tokio::test]
async fn list_is_cached_within_ttl() {
    let relay = spawn_relay(Duration::from_secs(60)).await.unwrap();

    let body = json!({ "self": self_node("0110000100000001", 10, 1), "nodes": [] });
    relay.store(&body, None).await.unwrap();
    let first = relay.list().await.unwrap();

    let body = json!({ "self": self_node("0110000100000002", 10, 1), "nodes": [] });
    relay.store(&body, None).await.unwrap();
    let second = relay.list().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second["nodes"].as_array().unwrap().len(), 1);
    assert_eq!(relay.registry.len(), 2);
}

#[tokio::test]
async fn list_reflects_changes_after_ttl() {
    let relay = spawn_relay(Duration::from_millis(50)).await.unwrap();

    let body = json!({ "self": self_node("0110000100000001", 10, 1), "nodes": [] });
    relay.store(&body, None).await.unwrap();
    assert_eq!(relay.list().await.unwrap()["nodes"].as_array().unwrap().len(), 1);

    let body = json!({ "self": self_node("0110000100000002", 10, 1), "nodes": [] });
    relay.store(&body, None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(relay.list().await.unwrap()["nodes"].as_array().unwrap().len(), 2);
}
