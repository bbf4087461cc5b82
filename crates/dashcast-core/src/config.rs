use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{DashcastError, Result};

pub const DEFAULT_PORT: u16 = 8765;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_INTERVAL_MS: u64 = 500; // broadcast cadence
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 250; // per-recipient delivery bound
pub const DEFAULT_CLIENT_QUEUE: usize = 16; // outbound messages buffered per client
pub const CLOSE_TIMEOUT_MS: u64 = 1_000; // close frame budget on shutdown
pub const DEFAULT_CONFIG_FILE: &str = "dashcast.toml";
pub const ENV_PREFIX: &str = "DASHCAST_";

/// Top-level config (dashcast.toml + DASHCAST_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DashcastConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: DEFAULT_PORT,
        }
    }
}

/// Broadcast loop tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BroadcastConfig {
    /// Tick period in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Upper bound for handing one payload to one client. A client that
    /// cannot take the payload within this window is dropped.
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// Capacity of each client's outbound queue.
    #[serde(default = "default_client_queue")]
    pub client_queue: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            send_timeout_ms: DEFAULT_SEND_TIMEOUT_MS,
            client_queue: DEFAULT_CLIENT_QUEUE,
        }
    }
}

impl BroadcastConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,
}

/// Where each tick's reading comes from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Constant sample reading.
    #[default]
    Fixed,
    /// JSON lines piped in on stdin, latest wins.
    Stdin,
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(SourceKind::Fixed),
            "stdin" => Ok(SourceKind::Stdin),
            other => Err(format!("unknown source kind: {other} (expected fixed|stdin)")),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}
fn default_send_timeout_ms() -> u64 {
    DEFAULT_SEND_TIMEOUT_MS
}
fn default_client_queue() -> usize {
    DEFAULT_CLIENT_QUEUE
}

impl DashcastConfig {
    /// Load config from an optional TOML file with DASHCAST_* env overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ./dashcast.toml
    ///
    /// A missing file is not an error; built-in defaults apply. Nested keys
    /// are addressed with a double underscore, e.g.
    /// `DASHCAST_BROADCAST__INTERVAL_MS=250`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path.unwrap_or(DEFAULT_CONFIG_FILE);

        let config: DashcastConfig = Figment::from(Serialized::defaults(DashcastConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| DashcastError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or spin the broadcast loop.
    pub fn validate(&self) -> Result<()> {
        if self.broadcast.interval_ms == 0 {
            return Err(DashcastError::Config(
                "broadcast.interval_ms must be greater than zero".into(),
            ));
        }
        if self.broadcast.send_timeout_ms == 0 {
            return Err(DashcastError::Config(
                "broadcast.send_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.broadcast.client_queue == 0 {
            return Err(DashcastError::Config(
                "broadcast.client_queue must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Resolve `server.bind` + `server.port` into a listen address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.server.bind.parse().map_err(|e| {
            DashcastError::Config(format!("invalid bind address {}: {e}", self.server.bind))
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}
