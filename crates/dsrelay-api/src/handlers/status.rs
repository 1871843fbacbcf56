//! /status — aggregate counts for monitoring.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::ApiState;

#[derive(Serialize)]
pub struct StatusResponse {
    /// Registered nodes of either kind.
    pub nodes: usize,
    pub basic: usize,
    pub extended: usize,
    /// Reported online but without a registry entry.
    pub extra_online: usize,
    /// `nodes + extra_online`.
    pub total_known: usize,
    pub watch_queue: usize,
    /// Identities heard via REPORTSELF within the Extended TTL.
    pub self_reporting: usize,
}

pub async fn handle_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let counts = state.registry.count_by_kind();
    let extra_online = state.watch.extra_count();

    Json(StatusResponse {
        nodes: counts.total,
        basic: counts.basic,
        extended: counts.extended,
        extra_online,
        total_known: counts.total + extra_online,
        watch_queue: state.watch.queue_len(),
        self_reporting: state.relay.self_reporting(Instant::now()),
    })
}
