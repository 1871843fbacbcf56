//! /list — the memoized, gzip-compressed node list.
//!
//! Uncompressed responses are never served; a client that does not accept
//! gzip gets a 400.

use std::time::Instant;

use axum::extract::State;
use axum::http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE, VARY};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use super::ApiState;

pub async fn handle_list(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Response, (StatusCode, String)> {
    if !accepts_gzip(&headers) {
        return Err((
            StatusCode::BAD_REQUEST,
            "client must accept gzip encoding".to_string(),
        ));
    }

    let payload = state.cache.get(Instant::now()).await.map_err(|e| {
        tracing::error!(error = %e, "failed to build node list");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to build node list".to_string(),
        )
    })?;

    Ok((
        [
            (CONTENT_TYPE, "application/json"),
            (CONTENT_ENCODING, "gzip"),
            (VARY, "Accept-Encoding"),
        ],
        payload,
    )
        .into_response())
}

/// Does any Accept-Encoding header allow gzip with a non-zero q-value?
fn accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get_all(ACCEPT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|item| {
            let mut parts = item.split(';');
            let coding = parts.next().unwrap_or("").trim();
            if !coding.eq_ignore_ascii_case("gzip") && coding != "*" {
                return false;
            }
            parts
                .filter_map(|p| p.trim().strip_prefix("q="))
                .all(|q| q.trim().parse::<f32>().map(|q| q > 0.0).unwrap_or(false))
        })
}
