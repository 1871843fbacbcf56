//! Node registry — the relay's local view of active players.
//!
//! A concurrent map from SteamId to the current record, its origin and the
//! instant it was last reported. Every inbound report goes through
//! [`NodeRegistry::upsert`], which merges under the shard lock so two reports
//! for the same identity can never lose each other's fields. A periodic sweep
//! removes entries whose kind-specific TTL has elapsed.
//!
//! The clock is always passed in. Nothing here calls `Instant::now()`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

use dsrelay_core::{NodeKind, NodeRecord, SteamId};

/// Where the most recent report for an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The player's own client, via the `self` field of `/store`.
    Direct,
    /// Another client's `/store` naming this player in its `nodes` list.
    Relayed,
    /// Another relay, via the broadcast channel.
    Gossip,
}

#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub record: NodeRecord,
    pub origin: Origin,
    pub last_seen: Instant,
}

/// Expiry TTLs by record kind.
#[derive(Debug, Clone, Copy)]
pub struct NodeTtl {
    pub basic: Duration,
    pub extended: Duration,
}

impl NodeTtl {
    pub fn for_kind(&self, kind: NodeKind) -> Duration {
        match kind {
            NodeKind::Basic => self.basic,
            NodeKind::Extended => self.extended,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub basic: usize,
    pub extended: usize,
    pub total: usize,
}

/// Shared registry handle. Cloning is cheap; all clones see the same map.
#[derive(Clone)]
pub struct NodeRegistry {
    nodes: Arc<DashMap<SteamId, RegistryEntry>>,
    ttl: NodeTtl,
}

impl NodeRegistry {
    pub fn new(ttl: NodeTtl) -> Self {
        Self {
            nodes: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> NodeTtl {
        self.ttl
    }

    /// Insert or merge a report and stamp it with `now`.
    ///
    /// The timestamp is refreshed even when the merge changes nothing:
    /// repeated identical reports are the heartbeat.
    pub fn upsert(&self, record: NodeRecord, origin: Origin, now: Instant) {
        let id = record.steamid();
        self.upsert_with(
            id,
            |existing| match existing {
                Some(existing) => record.merged_onto(existing),
                None => record,
            },
            origin,
            now,
        );
    }

    /// Like [`upsert`](Self::upsert), but the stored record is built from the
    /// current one while the entry is locked. `build` must not call back into
    /// the registry.
    pub fn upsert_with<F>(&self, id: SteamId, build: F, origin: Origin, now: Instant)
    where
        F: FnOnce(Option<&NodeRecord>) -> NodeRecord,
    {
        match self.nodes.entry(id) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.record = build(Some(&entry.record));
                entry.origin = origin;
                entry.last_seen = now;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(RegistryEntry {
                    record: build(None),
                    origin,
                    last_seen: now,
                });
            }
        }
    }

    /// Remove every entry whose TTL has elapsed at `now`.
    ///
    /// Liveness is judged under the shard write lock against the stored
    /// timestamp, so an upsert that lands first is never swept.
    pub fn expire(&self, now: Instant) -> Vec<SteamId> {
        let mut removed = Vec::new();
        self.nodes.retain(|id, entry| {
            let ttl = self.ttl.for_kind(entry.record.kind());
            let alive = now.saturating_duration_since(entry.last_seen) <= ttl;
            if !alive {
                removed.push(*id);
            }
            alive
        });
        removed
    }

    /// Point-in-time copy of all records, ordered by identity.
    pub fn snapshot(&self) -> Vec<NodeRecord> {
        self.entries().into_iter().map(|e| e.record).collect()
    }

    /// Point-in-time copy of all entries, ordered by identity.
    pub fn entries(&self) -> Vec<RegistryEntry> {
        let mut entries: Vec<RegistryEntry> =
            self.nodes.iter().map(|e| e.value().clone()).collect();
        entries.sort_by_key(|e| e.record.steamid());
        entries
    }

    pub fn get(&self, id: &SteamId) -> Option<NodeRecord> {
        self.nodes.get(id).map(|e| e.record.clone())
    }

    pub fn contains(&self, id: &SteamId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn count_by_kind(&self) -> KindCounts {
        let mut counts = KindCounts::default();
        for entry in self.nodes.iter() {
            match entry.record.kind() {
                NodeKind::Basic => counts.basic += 1,
                NodeKind::Extended => counts.extended += 1,
            }
            counts.total += 1;
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
