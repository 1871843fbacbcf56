//! Snapshot encoding — gzip-compressed JSON `{ "nodes": [...] }`.
//!
//! `/list` only serves clients that accept gzip, so the snapshot cache
//! memoizes the compressed bytes and handlers write them out as-is.

use std::io::Write;

use anyhow::{Context, Result};
use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;

use dsrelay_core::NodeRecord;

#[derive(Serialize)]
struct ListPayload<'a> {
    nodes: &'a [NodeRecord],
}

pub fn encode_gzip_json(nodes: &[NodeRecord]) -> Result<Bytes> {
    let json = serde_json::to_vec(&ListPayload { nodes }).context("failed to serialize node list")?;
    let mut encoder = GzEncoder::new(Vec::with_capacity(json.len() / 4), Compression::default());
    encoder.write_all(&json).context("gzip write failed")?;
    let compressed = encoder.finish().context("gzip finish failed")?;
    tracing::trace!(
        nodes = nodes.len(),
        raw = json.len(),
        compressed = compressed.len(),
        "snapshot encoded"
    );
    Ok(Bytes::from(compressed))
}

#[cfg(test)]
pub(crate) fn gunzip(data: &[u8]) -> Vec<u8> {
    use std::io::Read;
    let mut out = Vec::new();
    flate2::read::GzDecoder::new(data)
        .read_to_end(&mut out)
        .unwrap();
    out
}
