//! Telemetry sources: where each broadcast tick gets its reading.
//!
//! The broadcaster never computes readings itself. A source is polled once
//! per tick; `None` means "nothing to send this tick".

use async_trait::async_trait;
use dashcast_core::{config::SourceKind, DashcastError};
use dashcast_protocol::VehicleTelemetry;
use std::io::{BufRead, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};

#[async_trait]
pub trait TelemetrySource: Send {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    /// Reading to broadcast on the current tick.
    async fn next_reading(&mut self) -> Option<VehicleTelemetry>;
}

/// Build the source selected in config.
pub fn build_source(kind: SourceKind) -> Box<dyn TelemetrySource> {
    match kind {
        SourceKind::Fixed => Box::new(FixedSource::default()),
        SourceKind::Stdin => Box::new(StdinSource::spawn()),
    }
}

/// Yields the same reading on every tick.
pub struct FixedSource {
    reading: VehicleTelemetry,
}

impl FixedSource {
    pub fn new(reading: VehicleTelemetry) -> Self {
        Self { reading }
    }
}

impl Default for FixedSource {
    fn default() -> Self {
        Self::new(VehicleTelemetry::sample())
    }
}

#[async_trait]
impl TelemetrySource for FixedSource {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn next_reading(&mut self) -> Option<VehicleTelemetry> {
        Some(self.reading)
    }
}

/// Latest reading from a stream of JSON lines (one `VehicleTelemetry` per
/// line), fed by an external sensor/model process.
///
/// Lines are consumed on a dedicated OS thread; ticks always see the most
/// recent valid line. After EOF the last reading keeps being served.
///
/// The reader thread is detached. A read that never returns (an idle pipe)
/// does not hold up runtime shutdown.
pub struct StdinSource {
    latest: watch::Receiver<Option<VehicleTelemetry>>,
}

impl StdinSource {
    pub fn spawn() -> Self {
        Self::from_reader(BufReader::new(std::io::stdin()))
    }

    pub fn from_reader<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = watch::channel(None);
        std::thread::spawn(move || {
            for (idx, line) in reader.lines().enumerate() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        let err = DashcastError::Source {
                            source_name: "stdin".into(),
                            reason: e.to_string(),
                        };
                        warn!(error = %err, code = err.code(), "telemetry input failed");
                        return;
                    }
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match VehicleTelemetry::from_json(line) {
                    Ok(reading) => {
                        // receiver gone: the server has stopped
                        if tx.send(Some(reading)).is_err() {
                            return;
                        }
                    }
                    Err(e) => warn!(line = idx + 1, error = %e, "skipping malformed reading"),
                }
            }
            info!("telemetry input closed, holding last reading");
        });
        Self { latest: rx }
    }
}

#[async_trait]
impl TelemetrySource for StdinSource {
    fn name(&self) -> &'static str {
        "stdin"
    }

    async fn next_reading(&mut self) -> Option<VehicleTelemetry> {
        let latest = *self.latest.borrow();
        latest
    }
}
