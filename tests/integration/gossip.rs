use std::time::{Duration, Instant};

use serde_json::json;

use crate::*;

const A: &str = "0110000100000001";
const B: &str = "0110000100000002";

/// Relay-to-relay: what one relay learns over HTTP shows up in the other's
/// list after a publish, with extended fields intact.
#[tokio::test]
async fn published_nodes_reach_the_other_relay() {
    let mut east = spawn_relay(Duration::ZERO).await.unwrap();
    let west = spawn_relay(Duration::ZERO).await.unwrap();

    let body = json!({ "self": self_node(A, 50, 3), "nodes": [basic_node(B, 20)] });
    east.store(&body, Some("2017.01")).await.unwrap();

    let suppressed = east.relay.publish(&east.registry.entries(), Instant::now());
    assert_eq!(suppressed, 0);

    let lines = east.drain_outbound();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().any(|l| l.starts_with("REPORTSELF|Solaire,0110000100000001,50")));
    assert!(lines.iter().any(|l| l.starts_with("REPORT|Lautrec,0110000100000002,20")));

    let now = Instant::now();
    for line in &lines {
        assert!(west.relay.receive(line, now));
    }
    // Chat and other bots share the channel.
    assert!(!west.relay.receive("praise the sun!", now));

    let list = west.list().await.unwrap();
    let a = find_node(&list, A).unwrap();
    assert_eq!(a["covenant"], 3);
    assert_eq!(a["dscm_version"], "unknown");
    assert!(find_node(&list, B).unwrap().get("covenant").is_none());

    let status = west.status().await.unwrap();
    assert_eq!(status["self_reporting"], 1);
}

#[tokio::test]
async fn gossip_basic_report_keeps_local_extended_fields() {
    let relay = spawn_relay(Duration::ZERO).await.unwrap();

    let body = json!({ "self": self_node(A, 50, 3), "nodes": [] });
    relay.store(&body, Some("2017.01")).await.unwrap();

    relay
        .relay
        .receive("REPORT|Solaire,0110000100000001,51,1,3,10-0", Instant::now());

    let list = relay.list().await.unwrap();
    let a = find_node(&list, A).unwrap();
    assert_eq!(a["sl"], 51);
    assert_eq!(a["covenant"], 3);
    assert_eq!(a["dscm_version"], "2017.01");
}

#[tokio::test]
async fn forwarded_gossip_is_not_echoed() {
    let mut relay = spawn_relay(Duration::ZERO).await.unwrap();
    let now = Instant::now();

    relay
        .relay
        .receive("REPORT|Lautrec,0110000100000002,20,2,3,10-0", now);
    let suppressed = relay.relay.publish(&relay.registry.entries(), now);

    assert_eq!(suppressed, 1);
    assert!(relay.drain_outbound().is_empty());
}
