//! Periodic background tasks: expiry sweep, gossip publish, watch rebuild.
//!
//! Each runs on its own interval until the shutdown broadcast fires. None of
//! them hold any lock across an await.

use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::time::{interval_at, MissedTickBehavior};

use dsrelay_services::{GossipRelay, NodeRegistry, WatchScheduler};

/// Remove expired nodes, stale online IDs and old gossip bookkeeping.
pub async fn expiry_loop(
    registry: NodeRegistry,
    watch: WatchScheduler,
    relay: GossipRelay,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut interval = interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.recv() => return,
            _ = interval.tick() => {}
        }

        let now = Instant::now();
        let removed = registry.expire(now);
        let offline = watch.expire_online(now);
        relay.prune(now);

        if !removed.is_empty() || offline > 0 {
            tracing::debug!(
                removed = removed.len(),
                offline,
                remaining = registry.len(),
                "expired registry entries"
            );
        }
        for id in &removed {
            tracing::trace!(steamid = %id, "node expired");
        }
    }
}

/// Rebroadcast the registry to the channel.
pub async fn publish_loop(
    registry: NodeRegistry,
    relay: GossipRelay,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut interval = interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.recv() => return,
            _ = interval.tick() => {}
        }

        let entries = registry.entries();
        tracing::info!(nodes = entries.len(), "publishing nodes to channel");
        let suppressed = relay.publish(&entries, Instant::now());
        tracing::debug!(suppressed, "the network already knew about these nodes");
    }
}

/// Rebuild the watch queue after a warm-up, then on every period.
pub async fn watch_loop(
    watch: WatchScheduler,
    warmup: Duration,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut interval = interval_at(tokio::time::Instant::now() + warmup, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.recv() => return,
            _ = interval.tick() => {}
        }

        let queued = watch.rebuild();
        tracing::debug!(queued, "watch queue rebuilt");
    }
}
