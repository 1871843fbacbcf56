//! /store — a client reports itself, the players it sees, and who is online.

use std::time::Instant;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use serde::Deserialize;

use dsrelay_core::{BasicNode, ExtendedFields, ExtendedNode, NodeRecord, SteamId};
use dsrelay_services::Origin;

use super::ApiState;

#[derive(Debug, Deserialize)]
pub struct StoreRequest {
    #[serde(rename = "self")]
    pub self_node: SelfNode,
    pub nodes: Vec<BasicNode>,
    #[serde(default)]
    pub online_ids: Vec<SteamId>,
}

/// The reporting client's own record. Everything but the version, which
/// arrives as a header.
#[derive(Debug, Deserialize)]
pub struct SelfNode {
    pub steamid: SteamId,
    pub name: String,
    pub sl: i32,
    pub phantom_type: i32,
    pub mp_zone: i32,
    pub world: String,
    pub covenant: i32,
    pub indictments: i32,
}

impl SelfNode {
    fn into_record(self, dscm_version: String) -> NodeRecord {
        NodeRecord::Extended(ExtendedNode {
            base: BasicNode {
                steamid: self.steamid,
                name: self.name,
                sl: self.sl,
                phantom_type: self.phantom_type,
                mp_zone: self.mp_zone,
                world: self.world,
            },
            ext: ExtendedFields {
                covenant: self.covenant,
                indictments: self.indictments,
                dscm_version,
            },
        })
    }
}

/// The whole body is validated before anything touches the registry.
pub async fn handle_store(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, (StatusCode, String)> {
    let req: StoreRequest = serde_json::from_slice(&body)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid store body: {e}")))?;

    let version = headers
        .get(state.version_header.as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| state.legacy_version.clone());

    let now = Instant::now();
    let self_id = req.self_node.steamid;
    let node_count = req.nodes.len();
    let online_count = req.online_ids.len();

    state
        .registry
        .upsert(req.self_node.into_record(version), Origin::Direct, now);

    for node in req.nodes {
        // A client listing itself must not demote its own direct report.
        if node.steamid == self_id {
            continue;
        }
        state
            .registry
            .upsert(NodeRecord::Basic(node), Origin::Relayed, now);
    }

    state.watch.mark_online(req.online_ids, now);

    tracing::debug!(
        steamid = %self_id,
        nodes = node_count,
        online = online_count,
        "store"
    );

    Ok(StatusCode::OK)
}
