use std::time::Duration;

use serde_json::json;

use crate::*;

const A: &str = "0110000100000001";
const B: &str = "0110000100000002";
const X: &str = "01100001000000aa";
const Y: &str = "01100001000000bb";

#[tokio::test]
async fn status_counts_kinds_and_extra_online() {
    let relay = spawn_relay(Duration::ZERO).await.unwrap();

    let body = json!({
        "self": self_node(A, 50, 3),
        "nodes": [basic_node(B, 20)],
        // A is registered; X and Y are only known online.
        "online_ids": [A, X, Y],
    });
    relay.store(&body, None).await.unwrap();

    let status = relay.status().await.unwrap();
    assert_eq!(status["nodes"], 2);
    assert_eq!(status["basic"], 1);
    assert_eq!(status["extended"], 1);
    assert_eq!(status["extra_online"], 2);
    assert_eq!(status["total_known"], 4);
    assert_eq!(status["watch_queue"], 0);
}

#[tokio::test]
async fn get_watch_is_empty_until_rebuild() {
    let relay = spawn_relay(Duration::ZERO).await.unwrap();
    let url = format!("{}/get_watch", relay.base);

    let resp = relay.http.get(&url).send().await.unwrap();
    assert_eq!(resp.status(), 204);

    let body = json!({ "self": self_node(A, 50, 3), "nodes": [], "online_ids": [X] });
    relay.store(&body, None).await.unwrap();
    assert_eq!(relay.watch.rebuild(), 1);

    let resp = relay.http.get(&url).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let watch: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(watch, json!({ "watch": X }));
}

#[tokio::test]
async fn get_watch_round_robins_candidates() {
    let relay = spawn_relay(Duration::ZERO).await.unwrap();

    let body = json!({ "self": self_node(A, 50, 3), "nodes": [], "online_ids": [X, Y] });
    relay.store(&body, None).await.unwrap();
    relay.watch.rebuild();

    let mut handed = Vec::new();
    for _ in 0..4 {
        let watch: serde_json::Value = relay
            .http
            .get(format!("{}/get_watch", relay.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        handed.push(watch["watch"].as_str().unwrap().to_string());
    }

    assert_eq!(handed[0], handed[2]);
    assert_eq!(handed[1], handed[3]);
    assert_ne!(handed[0], handed[1]);
}
