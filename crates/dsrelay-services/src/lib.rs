//! dsrelay-services — registry, snapshot cache, gossip relay and watch
//! scheduler. Shared by the HTTP API and the daemon's background tasks.

pub mod cache;
pub mod codec;
pub mod gossip;
pub mod registry;
pub mod watch;

pub use cache::{SnapshotCache, SnapshotEncoder};
pub use codec::encode_gzip_json;
pub use gossip::{GossipRelay, OutboundReport};
pub use registry::{KindCounts, NodeRegistry, NodeTtl, Origin, RegistryEntry};
pub use watch::WatchScheduler;
