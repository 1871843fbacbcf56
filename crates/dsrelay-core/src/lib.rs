//! dsrelay-core — node model, broadcast envelope format, and configuration.
//! All other dsrelay crates depend on this one.

pub mod config;
pub mod envelope;
pub mod identity;
pub mod node;

pub use envelope::{Envelope, EnvelopeError, EnvelopeExtras, ReportKind};
pub use identity::{IdentityError, SteamId};
pub use node::{BasicNode, ExtendedFields, ExtendedNode, NodeKind, NodeRecord};
