//! Snapshot cache — short-TTL memoization of the encoded registry.
//!
//! `/list` is the hot path: every client polls it. Rebuilding means copying
//! the registry, serializing and compressing it, so one encoded payload is
//! kept and reused until it is older than the TTL.
//!
//! Recomputation is single-flight. The slot mutex is held across the rebuild,
//! so callers that find the payload stale queue behind the first one and get
//! its fresh result instead of rebuilding again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use bytes::Bytes;
use tokio::sync::Mutex;

use dsrelay_core::NodeRecord;

use crate::registry::NodeRegistry;

/// Turns a registry snapshot into the served payload.
pub type SnapshotEncoder = Arc<dyn Fn(&[NodeRecord]) -> Result<Bytes> + Send + Sync>;

struct CachedPayload {
    payload: Bytes,
    produced_at: Instant,
}

#[derive(Clone)]
pub struct SnapshotCache {
    registry: NodeRegistry,
    ttl: Duration,
    encode: SnapshotEncoder,
    slot: Arc<Mutex<Option<CachedPayload>>>,
    rebuilds: Arc<AtomicU64>,
}

impl SnapshotCache {
    pub fn new(registry: NodeRegistry, ttl: Duration, encode: SnapshotEncoder) -> Self {
        Self {
            registry,
            ttl,
            encode,
            slot: Arc::new(Mutex::new(None)),
            rebuilds: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Cache using the gzip-JSON encoder served by `/list`.
    pub fn gzip_json(registry: NodeRegistry, ttl: Duration) -> Self {
        Self::new(registry, ttl, Arc::new(crate::codec::encode_gzip_json))
    }

    /// Return the cached payload, rebuilding it if older than the TTL.
    pub async fn get(&self, now: Instant) -> Result<Bytes> {
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref() {
            if now.saturating_duration_since(cached.produced_at) < self.ttl {
                return Ok(cached.payload.clone());
            }
        }

        let records = self.registry.snapshot();
        let payload = (self.encode)(&records)?;
        *slot = Some(CachedPayload {
            payload: payload.clone(),
            produced_at: now,
        });
        self.rebuilds.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(nodes = records.len(), bytes = payload.len(), "snapshot rebuilt");

        Ok(payload)
    }

    /// How many times the payload has been rebuilt.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds.load(Ordering::Relaxed)
    }
}
