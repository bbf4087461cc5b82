//! `dashcast watch`: terminal dashboard client.
//!
//! Connects to a broadcaster, prints every reading with its efficiency band
//! and gear advice, and reconnects after a fixed delay when the connection
//! drops.

pub mod advisor;

use std::time::{Duration, Instant};

use anyhow::Context;
use dashcast_protocol::VehicleTelemetry;
use futures_util::StreamExt;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use advisor::{GearAdvisor, GearWarning};

pub const DEFAULT_URL: &str = "ws://localhost:8765";
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Watch `url` until `shutdown` is cancelled, printing each reading.
pub async fn run(url: &str, shutdown: CancellationToken) -> anyhow::Result<()> {
    run_with(url, RECONNECT_DELAY, shutdown, |reading, advice| {
        println!("{}", render(reading, advice));
    })
    .await
}

/// Reconnect loop behind [`run`]. `on_reading` sees every parsed reading
/// together with the advisor's verdict for it.
pub async fn run_with<F>(
    url: &str,
    reconnect_delay: Duration,
    shutdown: CancellationToken,
    mut on_reading: F,
) -> anyhow::Result<()>
where
    F: FnMut(&VehicleTelemetry, Option<&GearWarning>) + Send,
{
    let mut advisor = GearAdvisor::new();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            result = session(url, &mut advisor, &mut on_reading) => match result {
                Ok(()) => info!(url, "disconnected from broadcaster"),
                Err(e) => warn!(url, error = %e, "connection error"),
            },
        }

        info!(delay_ms = reconnect_delay.as_millis() as u64, "reconnecting");
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }
}

/// One connection lifetime: read readings until the server goes away.
async fn session<F>(url: &str, advisor: &mut GearAdvisor, on_reading: &mut F) -> anyhow::Result<()>
where
    F: FnMut(&VehicleTelemetry, Option<&GearWarning>),
{
    let (ws, _) = connect_async(url)
        .await
        .with_context(|| format!("failed to connect to {url}"))?;
    info!(url, "connected to broadcaster");

    let (_sink, mut stream) = ws.split();
    while let Some(msg) = stream.next().await {
        match msg.context("websocket read failed")? {
            Message::Text(text) => match VehicleTelemetry::from_json(text.as_str()) {
                Ok(reading) => {
                    let advice = advisor.observe(&reading, Instant::now());
                    on_reading(&reading, advice.as_ref());
                }
                Err(e) => warn!(error = %e, "ignoring malformed reading"),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }
    Ok(())
}

/// One output line per reading.
pub fn render(reading: &VehicleTelemetry, advice: Option<&GearWarning>) -> String {
    let mut line = format!(
        "{} fuel {:.1}L in / {:.1}L out | gear {} | {} rpm | {} km/h | {:.1} km/L [{}]",
        chrono::Local::now().format("%H:%M:%S"),
        reading.fuel_in,
        reading.fuel_out,
        gear_label(reading.gear),
        reading.rpm,
        reading.speed,
        reading.mileage,
        reading.efficiency().as_str(),
    );
    if let Some(w) = advice {
        line.push_str(" ! ");
        line.push_str(&w.message);
    }
    line
}

fn gear_label(gear: u8) -> String {
    if gear == 0 {
        "N".to_string()
    } else {
        gear.to_string()
    }
}
