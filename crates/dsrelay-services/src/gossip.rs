//! Gossip relay — bridges the registry and the shared broadcast channel.
//!
//! Outbound, the registry is periodically re-published as envelope lines so
//! other relays converge on the same set of nodes. Records that only came
//! from other clients or relays are skipped while the channel has already
//! carried them recently; otherwise every relay would keep re-forwarding the
//! others' forwards. The outbound queue is bounded. When the transport falls
//! behind, the rest of a publish is dropped and goes out on a later tick.
//! A record counts as carried only once the transport has written it
//! ([`GossipRelay::mark_published`]).
//!
//! Inbound, each channel line is parsed and upserted. Lines that do not parse
//! are dropped without complaint: the channel is shared with chat and other
//! bots.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};

use dsrelay_core::{
    Envelope, ExtendedFields, ExtendedNode, NodeRecord, ReportKind, SteamId,
};

use crate::registry::{NodeRegistry, Origin, RegistryEntry};

/// Version tag for Extended records first learned over gossip.
/// The envelope does not carry the client version.
pub const UNKNOWN_VERSION: &str = "unknown";

/// One encoded envelope waiting for the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReport {
    pub steamid: SteamId,
    pub line: String,
}

#[derive(Clone)]
pub struct GossipRelay {
    registry: NodeRegistry,
    outbound: mpsc::Sender<OutboundReport>,
    suppression_window: Duration,
    /// Last time the channel carried a record for this identity, in either
    /// direction.
    channel_seen: Arc<DashMap<SteamId, Instant>>,
    /// Last `REPORTSELF` seen for this identity.
    self_seen: Arc<DashMap<SteamId, Instant>>,
}

impl GossipRelay {
    pub fn new(
        registry: NodeRegistry,
        outbound: mpsc::Sender<OutboundReport>,
        suppression_window: Duration,
    ) -> Self {
        Self {
            registry,
            outbound,
            suppression_window,
            channel_seen: Arc::new(DashMap::new()),
            self_seen: Arc::new(DashMap::new()),
        }
    }

    /// Queue envelope lines for `entries`. Returns how many were suppressed.
    pub fn publish(&self, entries: &[RegistryEntry], now: Instant) -> usize {
        let mut suppressed = 0;
        let mut queued = 0;
        let mut dropped = 0;

        for entry in entries {
            let id = entry.record.steamid();
            if entry.origin != Origin::Direct && self.seen_on_channel_within_window(&id, now) {
                suppressed += 1;
                continue;
            }

            let kind = match entry.origin {
                Origin::Direct => ReportKind::ReportSelf,
                Origin::Relayed | Origin::Gossip => ReportKind::Report,
            };
            let report = OutboundReport {
                steamid: id,
                line: Envelope::encode(kind, &entry.record),
            };
            match self.outbound.try_send(report) {
                Ok(()) => queued += 1,
                Err(TrySendError::Full(_)) => dropped += 1,
                Err(TrySendError::Closed(_)) => {
                    tracing::warn!("broadcast transport closed, dropping publish");
                    break;
                }
            }
        }

        if dropped > 0 {
            tracing::warn!(dropped, "outbound gossip queue full");
        }
        tracing::debug!(queued, suppressed, "gossip publish");
        suppressed
    }

    /// Record that the transport wrote a report for `id` to the channel.
    pub fn mark_published(&self, id: SteamId, now: Instant) {
        self.channel_seen.insert(id, now);
    }

    /// Handle one raw line from the channel. Returns whether it was a report.
    pub fn receive(&self, raw: &str, now: Instant) -> bool {
        let envelope = match Envelope::parse(raw.trim_end()) {
            Ok(env) => env,
            Err(e) => {
                tracing::trace!(error = %e, "ignoring channel message");
                return false;
            }
        };

        let id = envelope.steamid();
        let kind = envelope.kind;
        let base = envelope.base;
        let extras = envelope.extras;

        // Built under the entry lock so a concurrent direct report is never
        // overwritten with fields read before it landed.
        self.registry.upsert_with(
            id,
            |existing| match extras {
                Some(extras) => {
                    let dscm_version = existing
                        .and_then(|r| r.extended())
                        .map(|ext| ext.dscm_version.clone())
                        .unwrap_or_else(|| UNKNOWN_VERSION.to_string());
                    NodeRecord::Extended(ExtendedNode {
                        base,
                        ext: ExtendedFields {
                            covenant: extras.covenant,
                            indictments: extras.indictments,
                            dscm_version,
                        },
                    })
                }
                None => match existing {
                    Some(existing) => NodeRecord::Basic(base).merged_onto(existing),
                    None => NodeRecord::Basic(base),
                },
            },
            Origin::Gossip,
            now,
        );

        self.channel_seen.insert(id, now);
        if kind == ReportKind::ReportSelf {
            self.self_seen.insert(id, now);
        }
        true
    }

    /// Drop bookkeeping that can no longer affect suppression or status.
    pub fn prune(&self, now: Instant) {
        let window = self.suppression_window;
        self.channel_seen
            .retain(|_, seen| now.saturating_duration_since(*seen) < window);
        let self_ttl = self.registry.ttl().extended;
        self.self_seen
            .retain(|_, seen| now.saturating_duration_since(*seen) <= self_ttl);
    }

    /// Identities that sent `REPORTSELF` within the Extended TTL.
    pub fn self_reporting(&self, now: Instant) -> usize {
        let self_ttl = self.registry.ttl().extended;
        self.self_seen
            .iter()
            .filter(|e| now.saturating_duration_since(*e.value()) <= self_ttl)
            .count()
    }

    fn seen_on_channel_within_window(&self, id: &SteamId, now: Instant) -> bool {
        self.channel_seen
            .get(id)
            .map(|seen| now.saturating_duration_since(*seen) < self.suppression_window)
            .unwrap_or(false)
    }
}
