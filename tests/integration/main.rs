//! dsrelay integration test harness.
//!
//! Each test starts its own relay in-process: a real axum server on an
//! ephemeral loopback port, backed by real services. The gossip transport is
//! the relay's outbound queue, so tests can carry lines between relays by
//! hand instead of running an IRC server.

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use dsrelay_api::ApiState;
use dsrelay_services::{
    GossipRelay, NodeRegistry, NodeTtl, OutboundReport, SnapshotCache, WatchScheduler,
};

mod gossip;
mod list;
mod status;
mod store;

// ── Harness ───────────────────────────────────────────────────────────────────

pub const VERSION_HEADER: &str = "X-DSCM-Version";
pub const LEGACY_VERSION: &str = "legacy";

pub struct TestRelay {
    pub base: String,
    pub registry: NodeRegistry,
    pub relay: GossipRelay,
    pub watch: WatchScheduler,
    /// Lines this relay would write to the broadcast channel.
    pub outbound: mpsc::Receiver<OutboundReport>,
    pub http: reqwest::Client,
}

/// Start a relay with a snapshot cache TTL of `cache_ttl`.
pub async fn spawn_relay(cache_ttl: Duration) -> Result<TestRelay> {
    let registry = NodeRegistry::new(NodeTtl {
        basic: Duration::from_secs(600),
        extended: Duration::from_secs(300),
    });
    let cache = SnapshotCache::gzip_json(registry.clone(), cache_ttl);
    let watch = WatchScheduler::new(registry.clone(), Duration::from_secs(120));
    let (tx, outbound) = mpsc::channel(256);
    let relay = GossipRelay::new(registry.clone(), tx, Duration::from_secs(180));

    let state = ApiState {
        registry: registry.clone(),
        cache,
        relay: relay.clone(),
        watch: watch.clone(),
        version_header: VERSION_HEADER.to_string(),
        legacy_version: LEGACY_VERSION.to_string(),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, dsrelay_api::router(state)).await;
    });

    Ok(TestRelay {
        base: format!("http://{}", addr),
        registry,
        relay,
        watch,
        outbound,
        http: reqwest::Client::new(),
    })
}

impl TestRelay {
    pub async fn store(&self, body: &Value, version: Option<&str>) -> Result<reqwest::StatusCode> {
        let mut req = self.http.post(format!("{}/store", self.base)).json(body);
        if let Some(v) = version {
            req = req.header(VERSION_HEADER, v);
        }
        Ok(req.send().await?.status())
    }

    pub async fn store_raw(&self, body: &str) -> Result<reqwest::StatusCode> {
        let resp = self
            .http
            .post(format!("{}/store", self.base))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await?;
        Ok(resp.status())
    }

    /// Fetch `/list` (gzip negotiated and decoded by reqwest).
    pub async fn list(&self) -> Result<Value> {
        let resp = self.http.get(format!("{}/list", self.base)).send().await?;
        anyhow::ensure!(resp.status().is_success(), "/list returned {}", resp.status());
        Ok(resp.json().await?)
    }

    pub async fn status(&self) -> Result<Value> {
        Ok(self
            .http
            .get(format!("{}/status", self.base))
            .send()
            .await?
            .json()
            .await?)
    }

    /// Everything queued for the broadcast channel so far.
    pub fn drain_outbound(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(report) = self.outbound.try_recv() {
            lines.push(report.line);
        }
        lines
    }
}

// ── Fixtures ──────────────────────────────────────────────────────────────────

pub fn self_node(steamid: &str, sl: i32, covenant: i32) -> Value {
    json!({
        "steamid": steamid,
        "name": "Solaire",
        "sl": sl,
        "phantom_type": 1,
        "mp_zone": 3,
        "world": "10-0",
        "covenant": covenant,
        "indictments": 0,
    })
}

pub fn basic_node(steamid: &str, sl: i32) -> Value {
    json!({
        "steamid": steamid,
        "name": "Lautrec",
        "sl": sl,
        "phantom_type": 2,
        "mp_zone": 3,
        "world": "10-0",
    })
}

/// Find a node by steamid in a `/list` response.
pub fn find_node<'a>(list: &'a Value, steamid: &str) -> Option<&'a Value> {
    list["nodes"]
        .as_array()?
        .iter()
        .find(|n| n["steamid"] == steamid)
}
