//! HTTP API handlers — the client-facing surface of the relay.

pub mod list;
pub mod status;
pub mod store;
pub mod watch;

use dsrelay_services::{GossipRelay, NodeRegistry, SnapshotCache, WatchScheduler};

#[derive(Clone)]
pub struct ApiState {
    pub registry: NodeRegistry,
    pub cache: SnapshotCache,
    pub relay: GossipRelay,
    pub watch: WatchScheduler,
    /// Request header carrying the reporting client's version.
    pub version_header: String,
    /// Version tag recorded when that header is missing.
    pub legacy_version: String,
}

// Re-export handler functions for use in router setup.
pub use list::handle_list;
pub use status::handle_status;
pub use store::handle_store;
pub use watch::handle_get_watch;
