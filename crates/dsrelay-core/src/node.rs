//! Node records — what the relay knows about a player.
//!
//! Two fidelity levels share one base projection:
//! - Basic:    the six fields any client can report about any other player
//! - Extended: Basic plus covenant, indictments and the reporting client's
//!   version tag, only known when the player's own client reports itself
//!
//! Extended is a strict superset. Once an identity is known in Extended form,
//! a later Basic report updates the base fields but never drops the extended
//! ones (see [`NodeRecord::merged_onto`]).

use serde::{Deserialize, Serialize};

use crate::identity::SteamId;

/// The six fields every report carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicNode {
    pub steamid: SteamId,
    pub name: String,
    /// Soul level.
    pub sl: i32,
    pub phantom_type: i32,
    pub mp_zone: i32,
    pub world: String,
}

/// Fields only a player's own client can report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedFields {
    pub covenant: i32,
    pub indictments: i32,
    /// Version tag of the reporting client.
    pub dscm_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedNode {
    #[serde(flatten)]
    pub base: BasicNode,
    #[serde(flatten)]
    pub ext: ExtendedFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Basic,
    Extended,
}

/// A node as stored in the registry and served from `/list`.
///
/// Serializes flat: a Basic record has the six base keys, an Extended record
/// adds `covenant`, `indictments` and `dscm_version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NodeRecord {
    Basic(BasicNode),
    Extended(ExtendedNode),
}

impl NodeRecord {
    pub fn steamid(&self) -> SteamId {
        self.base().steamid
    }

    pub fn base(&self) -> &BasicNode {
        match self {
            NodeRecord::Basic(b) => b,
            NodeRecord::Extended(e) => &e.base,
        }
    }

    pub fn extended(&self) -> Option<&ExtendedFields> {
        match self {
            NodeRecord::Basic(_) => None,
            NodeRecord::Extended(e) => Some(&e.ext),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRecord::Basic(_) => NodeKind::Basic,
            NodeRecord::Extended(_) => NodeKind::Extended,
        }
    }

    /// Merge this incoming report onto the currently stored record.
    ///
    /// Every field the incoming record carries wins. Extended fields the
    /// incoming record lacks are taken from `existing` when it has them.
    pub fn merged_onto(self, existing: &NodeRecord) -> NodeRecord {
        debug_assert_eq!(self.steamid(), existing.steamid());
        match (self, existing) {
            (NodeRecord::Basic(base), NodeRecord::Extended(known)) => {
                NodeRecord::Extended(ExtendedNode {
                    base,
                    ext: known.ext.clone(),
                })
            }
            (incoming, _) => incoming,
        }
    }
}

impl From<BasicNode> for NodeRecord {
    fn from(node: BasicNode) -> Self {
        NodeRecord::Basic(node)
    }
}

impl From<ExtendedNode> for NodeRecord {
    fn from(node: ExtendedNode) -> Self {
        NodeRecord::Extended(node)
    }
}
