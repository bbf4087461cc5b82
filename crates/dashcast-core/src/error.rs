use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashcastError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Telemetry source error ({source_name}): {reason}")]
    Source { source_name: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DashcastError {
    /// Short error code string, stable across releases for log filtering.
    pub fn code(&self) -> &'static str {
        match self {
            DashcastError::Config(_) => "CONFIG_ERROR",
            DashcastError::Bind { .. } => "BIND_FAILED",
            DashcastError::Source { .. } => "SOURCE_ERROR",
            DashcastError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, DashcastError>;
