use std::time::Duration;

use serde_json::json;

use crate::*;

const A: &str = "0110000100000001";
const B: &str = "0110000100000002";
const C: &str = "0110000100000003";

#[tokio::test]
async fn store_registers_self_and_seen_nodes() {
    let relay = spawn_relay(Duration::ZERO).await.unwrap();

    let body = json!({
        "self": self_node(A, 50, 3),
        "nodes": [basic_node(B, 20), basic_node(C, 30)],
        "online_ids": [],
    });
    assert_eq!(relay.store(&body, Some("2017.01")).await.unwrap(), 200);

    let list = relay.list().await.unwrap();
    assert_eq!(list["nodes"].as_array().unwrap().len(), 3);

    let me = find_node(&list, A).unwrap();
    assert_eq!(me["covenant"], 3);
    assert_eq!(me["dscm_version"], "2017.01");

    let seen = find_node(&list, B).unwrap();
    assert_eq!(seen["sl"], 20);
    assert!(seen.get("covenant").is_none());
}

#[tokio::test]
async fn missing_version_header_records_legacy_tag() {
    let relay = spawn_relay(Duration::ZERO).await.unwrap();

    let body = json!({ "self": self_node(A, 50, 3), "nodes": [] });
    assert_eq!(relay.store(&body, None).await.unwrap(), 200);

    let list = relay.list().await.unwrap();
    assert_eq!(find_node(&list, A).unwrap()["dscm_version"], LEGACY_VERSION);
}

#[tokio::test]
async fn third_party_report_does_not_demote_extended_node() {
    let relay = spawn_relay(Duration::ZERO).await.unwrap();

    let from_a = json!({ "self": self_node(A, 10, 3), "nodes": [] });
    relay.store(&from_a, Some("2017.01")).await.unwrap();

    // B reports seeing A at a higher soul level.
    let from_b = json!({ "self": self_node(B, 20, 1), "nodes": [basic_node(A, 12)] });
    relay.store(&from_b, Some("2017.01")).await.unwrap();

    let list = relay.list().await.unwrap();
    let a = find_node(&list, A).unwrap();
    assert_eq!(a["sl"], 12);
    assert_eq!(a["covenant"], 3);
    assert_eq!(a["indictments"], 0);
    assert_eq!(a["name"], "Lautrec");
}

#[tokio::test]
async fn malformed_store_is_rejected_without_mutation() {
    let relay = spawn_relay(Duration::ZERO).await.unwrap();

    // Non-numeric soul level in the second node: nothing from this body lands.
    let mut bad_node = basic_node(C, 1);
    bad_node["sl"] = json!("ten");
    let body = json!({
        "self": self_node(A, 50, 3),
        "nodes": [basic_node(B, 20), bad_node],
    });
    assert_eq!(relay.store(&body, None).await.unwrap(), 400);

    // Missing a required Basic field.
    let body = json!({
        "self": self_node(A, 50, 3),
        "nodes": [{ "steamid": B, "name": "x" }],
    });
    assert_eq!(relay.store(&body, None).await.unwrap(), 400);

    // Bad online id.
    let body = json!({ "self": self_node(A, 50, 3), "nodes": [], "online_ids": ["xyz"] });
    assert_eq!(relay.store(&body, None).await.unwrap(), 400);

    assert_eq!(relay.store_raw("{not json").await.unwrap(), 400);
    assert_eq!(relay.store_raw("{}").await.unwrap(), 400);

    assert!(relay.registry.is_empty());
    assert_eq!(relay.watch.extra_count(), 0);
}

#[tokio::test]
async fn client_listing_itself_stays_self_reported() {
    let relay = spawn_relay(Duration::ZERO).await.unwrap();

    let body = json!({
        "self": self_node(A, 50, 3),
        "nodes": [basic_node(A, 1)],
    });
    relay.store(&body, Some("2017.01")).await.unwrap();

    let entry = relay.registry.entries().pop().unwrap();
    assert_eq!(entry.origin, dsrelay_services::Origin::Direct);
    assert_eq!(entry.record.base().sl, 50);
}
