//! Node identity — the 64-bit Steam ID every report is keyed on.
//!
//! Rendered as 16 lowercase hex digits everywhere it leaves the process:
//! JSON bodies, envelope lines, the watch handout. Parsing is
//! case-insensitive but requires all 16 digits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque peer identity, trusted as supplied by the reporting client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SteamId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid hex in identity: {0:?}")]
    InvalidHex(String),
    #[error("identity must be 8 bytes (16 hex digits), got {0}")]
    WrongLength(usize),
}

impl SteamId {
    pub fn to_hex(self) -> String {
        format!("{:016x}", self.0)
    }
}

impl fmt::Display for SteamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for SteamId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| IdentityError::InvalidHex(s.to_string()))?;
        if bytes.len() != 8 {
            return Err(IdentityError::WrongLength(bytes.len()));
        }
        let mut arr = [0u8; 8];
        arr.copy_from_slice(&bytes);
        Ok(SteamId(u64::from_be_bytes(arr)))
    }
}

impl Serialize for SteamId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SteamId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
