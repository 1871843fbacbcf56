//! Broadcast-channel envelope — the text line relays exchange over chat.
//!
//! ```text
//! REPORT|name,steamid,sl,phantom_type,mp_zone,world[,covenant,indictments]
//! REPORTSELF|<same field layout>
//! ```
//!
//! Six fields is a Basic report, eight is an Extended one. Any other shape is
//! rejected. The channel is shared with foreign traffic, so callers are
//! expected to drop parse errors quietly.

use crate::identity::SteamId;
use crate::node::{BasicNode, NodeRecord};

pub const TAG_REPORT: &str = "REPORT";
pub const TAG_REPORT_SELF: &str = "REPORTSELF";

/// Who the report is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// A relay forwarding what it knows about some player.
    Report,
    /// A report that originated from the player's own client.
    ReportSelf,
}

impl ReportKind {
    pub fn tag(self) -> &'static str {
        match self {
            ReportKind::Report => TAG_REPORT,
            ReportKind::ReportSelf => TAG_REPORT_SELF,
        }
    }
}

/// The two trailing fields of an Extended report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeExtras {
    pub covenant: i32,
    pub indictments: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub kind: ReportKind,
    pub base: BasicNode,
    pub extras: Option<EnvelopeExtras>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("missing '|' separator")]
    NoSeparator,
    #[error("unknown message type {0:?}")]
    UnknownType(String),
    #[error("expected 6 or 8 fields, got {0}")]
    FieldCount(usize),
    #[error("field {field} is not an integer: {value:?}")]
    NotInteger { field: &'static str, value: String },
    #[error("bad steamid: {0}")]
    BadIdentity(#[from] crate::identity::IdentityError),
}

impl Envelope {
    pub fn parse(line: &str) -> Result<Self, EnvelopeError> {
        let (tag, body) = line.split_once('|').ok_or(EnvelopeError::NoSeparator)?;
        let kind = match tag {
            TAG_REPORT => ReportKind::Report,
            TAG_REPORT_SELF => ReportKind::ReportSelf,
            other => return Err(EnvelopeError::UnknownType(other.to_string())),
        };

        let fields: Vec<&str> = body.split(',').collect();
        if fields.len() != 6 && fields.len() != 8 {
            return Err(EnvelopeError::FieldCount(fields.len()));
        }

        let base = BasicNode {
            name: fields[0].to_string(),
            steamid: fields[1].parse()?,
            sl: int_field("sl", fields[2])?,
            phantom_type: int_field("phantom_type", fields[3])?,
            mp_zone: int_field("mp_zone", fields[4])?,
            world: fields[5].to_string(),
        };

        let extras = if fields.len() == 8 {
            Some(EnvelopeExtras {
                covenant: int_field("covenant", fields[6])?,
                indictments: int_field("indictments", fields[7])?,
            })
        } else {
            None
        };

        Ok(Envelope { kind, base, extras })
    }

    pub fn steamid(&self) -> SteamId {
        self.base.steamid
    }

    /// Render a stored record as an envelope line.
    ///
    /// Separator characters are stripped from the free-text fields so the
    /// line always parses back into the same shape.
    pub fn encode(kind: ReportKind, record: &NodeRecord) -> String {
        let base = record.base();
        let mut line = format!(
            "{}|{},{},{},{},{},{}",
            kind.tag(),
            strip_separators(&base.name),
            base.steamid,
            base.sl,
            base.phantom_type,
            base.mp_zone,
            strip_separators(&base.world),
        );
        if let Some(ext) = record.extended() {
            line.push_str(&format!(",{},{}", ext.covenant, ext.indictments));
        }
        line
    }
}

fn int_field(field: &'static str, value: &str) -> Result<i32, EnvelopeError> {
    value.parse().map_err(|_| EnvelopeError::NotInteger {
        field,
        value: value.to_string(),
    })
}

pub fn strip_separators(s: &str) -> String {
    s.chars().filter(|c| *c != '|' && *c != ',').collect()
}
