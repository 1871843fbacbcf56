//! Watch scheduler — hands out probe candidates in weighted round-robin.
//!
//! Clients report which identities they can see online. Some of those never
//! produce a full node record here; they are worth probing. The scheduler
//! keeps the online signal, periodically rebuilds a queue from
//! `online − registry`, and hands entries out one at a time.
//!
//! Queue order on rebuild:
//!   1. never handed out first, then by how long ago the last handout was
//!   2. within equal rank, most recently seen online first
//!
//! Handout history is trimmed to twice the candidate count on each rebuild,
//! so old handouts stop weighing once the pool shrinks.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;

use dsrelay_core::SteamId;

use crate::registry::NodeRegistry;

#[derive(Default)]
struct WatchQueue {
    queue: Vec<SteamId>,
    cursor: usize,
    history: VecDeque<SteamId>,
}

#[derive(Clone)]
pub struct WatchScheduler {
    registry: NodeRegistry,
    online: Arc<DashMap<SteamId, Instant>>,
    online_ttl: Duration,
    state: Arc<Mutex<WatchQueue>>,
}

impl WatchScheduler {
    pub fn new(registry: NodeRegistry, online_ttl: Duration) -> Self {
        Self {
            registry,
            online: Arc::new(DashMap::new()),
            online_ttl,
            state: Arc::new(Mutex::new(WatchQueue::default())),
        }
    }

    /// Record identities reported online at `now`.
    pub fn mark_online(&self, ids: impl IntoIterator<Item = SteamId>, now: Instant) {
        for id in ids {
            self.online.insert(id, now);
        }
    }

    /// Drop online entries older than the online TTL. Returns how many.
    pub fn expire_online(&self, now: Instant) -> usize {
        let before = self.online.len();
        let ttl = self.online_ttl;
        self.online
            .retain(|_, seen| now.saturating_duration_since(*seen) <= ttl);
        before.saturating_sub(self.online.len())
    }

    /// Online identities with no registry entry, with their last-seen time.
    pub fn extra_online(&self) -> Vec<(SteamId, Instant)> {
        self.online
            .iter()
            .filter(|e| !self.registry.contains(e.key()))
            .map(|e| (*e.key(), *e.value()))
            .collect()
    }

    pub fn extra_count(&self) -> usize {
        self.online
            .iter()
            .filter(|e| !self.registry.contains(e.key()))
            .count()
    }

    /// Rebuild the queue from the current candidates. Returns its length.
    pub fn rebuild(&self) -> usize {
        let mut extra = self.extra_online();
        let mut state = self.state.lock();

        let keep = 2 * extra.len();
        while state.history.len() > keep {
            state.history.pop_front();
        }

        // Oldest to newest, so a repeated identity ends up at its latest position.
        let rank: HashMap<SteamId, i64> = state
            .history
            .iter()
            .enumerate()
            .map(|(pos, id)| (*id, pos as i64))
            .collect();
        let rank_of = |id: &SteamId| rank.get(id).copied().unwrap_or(-1);

        extra.sort_by(|(a, a_seen), (b, b_seen)| {
            rank_of(a)
                .cmp(&rank_of(b))
                .then_with(|| b_seen.cmp(a_seen))
                .then_with(|| a.cmp(b))
        });

        state.queue = extra.into_iter().map(|(id, _)| id).collect();
        state.cursor = 0;
        state.queue.len()
    }

    /// Next candidate, or `None` while the queue is empty.
    pub fn next(&self) -> Option<SteamId> {
        let mut state = self.state.lock();
        if state.queue.is_empty() {
            return None;
        }
        let id = state.queue[state.cursor];
        state.cursor = (state.cursor + 1) % state.queue.len();
        state.history.push_back(id);
        Some(id)
    }

    pub fn queue_len(&self) -> usize {
        self.state.lock().queue.len()
    }
}
