//! Configuration system for dsrelay.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $DSRELAY_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/dsrelay/config.toml
//!   3. ~/.config/dsrelay/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub network: NetworkConfig,
    pub irc: IrcConfig,
    pub registry: RegistryConfig,
    pub gossip: GossipConfig,
    pub watch: WatchConfig,
    pub cache: CacheConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address the HTTP API binds to.
    pub listen_addr: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IrcConfig {
    /// If false, the relay runs HTTP-only and never gossips.
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub nick: String,
    pub channel: String,
    /// OPER credentials. Sent after MOTD only when both are set.
    pub oper_user: Option<String>,
    pub oper_pass: Option<String>,
    /// Minimum gap between outbound lines, to stay under server flood limits.
    pub send_interval_ms: u64,
    /// Delay before reconnecting after the connection drops.
    pub reconnect_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Basic nodes may only be seen transitively, so they live longer.
    pub basic_ttl_secs: u64,
    /// Extended nodes heartbeat directly.
    pub extended_ttl_secs: u64,
    /// TTL for the online-identity signal.
    pub online_ttl_secs: u64,
    pub expiry_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GossipConfig {
    pub publish_interval_secs: u64,
    /// A gossip-learned record seen on the channel within this window is not
    /// published again. Must stay below the registry TTLs.
    pub suppression_window_secs: u64,
    /// Lines waiting for the chat transport. Publishes beyond this are
    /// dropped and retried on the next tick.
    pub outbound_queue_len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub warmup_secs: u64,
    pub rebuild_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Request header carrying the reporting client's version.
    pub version_header: String,
    /// Version tag used when the header is absent.
    pub legacy_version: String,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            port: 8811,
        }
    }
}

impl Default for IrcConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "dscm.wulf2k.ca".to_string(),
            port: 8123,
            nick: "server-bot".to_string(),
            channel: "#DSCM-Main".to_string(),
            oper_user: None,
            oper_pass: None,
            send_interval_ms: 250,
            reconnect_secs: 30,
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            basic_ttl_secs: 600,
            extended_ttl_secs: 300,
            online_ttl_secs: 120,
            expiry_interval_secs: 10,
        }
    }
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            publish_interval_secs: 110,
            suppression_window_secs: 180,
            outbound_queue_len: 512,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            warmup_secs: 30,
            rebuild_interval_secs: 10,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 5 }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            version_header: "X-DSCM-Version".to_string(),
            legacy_version: "legacy".to_string(),
        }
    }
}

// ── Duration accessors ────────────────────────────────────────────────────────

impl RegistryConfig {
    pub fn basic_ttl(&self) -> Duration {
        Duration::from_secs(self.basic_ttl_secs)
    }

    pub fn extended_ttl(&self) -> Duration {
        Duration::from_secs(self.extended_ttl_secs)
    }

    pub fn online_ttl(&self) -> Duration {
        Duration::from_secs(self.online_ttl_secs)
    }

    pub fn expiry_interval(&self) -> Duration {
        Duration::from_secs(self.expiry_interval_secs.max(1))
    }
}

impl GossipConfig {
    pub fn publish_interval(&self) -> Duration {
        Duration::from_secs(self.publish_interval_secs.max(1))
    }

    pub fn suppression_window(&self) -> Duration {
        Duration::from_secs(self.suppression_window_secs)
    }

    pub fn outbound_queue_len(&self) -> usize {
        self.outbound_queue_len.max(1)
    }
}

impl WatchConfig {
    pub fn warmup(&self) -> Duration {
        Duration::from_secs(self.warmup_secs)
    }

    pub fn rebuild_interval(&self) -> Duration {
        Duration::from_secs(self.rebuild_interval_secs.max(1))
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl IrcConfig {
    pub fn send_interval(&self) -> Duration {
        Duration::from_millis(self.send_interval_ms.max(1))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_secs)
    }

    /// OPER credentials, if both halves are configured.
    pub fn oper_credentials(&self) -> Option<(&str, &str)> {
        match (&self.oper_user, &self.oper_pass) {
            (Some(user), Some(pass)) if !user.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("dsrelay")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl RelayConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            RelayConfig::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("DSRELAY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&RelayConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply DSRELAY_* overrides. `lookup` is `std::env::var` in production.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("DSRELAY_NETWORK__LISTEN_ADDR") {
            self.network.listen_addr = v;
        }
        if let Some(p) = lookup("DSRELAY_NETWORK__PORT").and_then(|v| v.parse().ok()) {
            self.network.port = p;
        }
        if let Some(v) = lookup("DSRELAY_IRC__ENABLED") {
            self.irc.enabled = v == "true" || v == "1";
        }
        if let Some(v) = lookup("DSRELAY_IRC__HOST") {
            self.irc.host = v;
        }
        if let Some(p) = lookup("DSRELAY_IRC__PORT").and_then(|v| v.parse().ok()) {
            self.irc.port = p;
        }
        if let Some(v) = lookup("DSRELAY_IRC__NICK") {
            self.irc.nick = v;
        }
        if let Some(v) = lookup("DSRELAY_IRC__OPER_USER") {
            self.irc.oper_user = Some(v);
        }
        if let Some(v) = lookup("DSRELAY_IRC__OPER_PASS") {
            self.irc.oper_pass = Some(v);
        }
    }
}
