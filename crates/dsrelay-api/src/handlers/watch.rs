//! /get_watch — next probe candidate from the watch scheduler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::ApiState;

#[derive(Serialize)]
pub struct WatchResponse {
    /// 16 lowercase hex digits.
    pub watch: String,
}

/// An empty queue is answered with 204: nothing to probe right now.
pub async fn handle_get_watch(
    State(state): State<ApiState>,
) -> Result<Json<WatchResponse>, StatusCode> {
    let id = state.watch.next().ok_or(StatusCode::NO_CONTENT)?;
    Ok(Json(WatchResponse { watch: id.to_hex() }))
}
