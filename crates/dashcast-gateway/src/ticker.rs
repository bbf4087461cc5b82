use std::sync::Arc;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::app::AppState;
use crate::source::TelemetrySource;

/// Periodic broadcast loop. Runs until the shutdown token fires.
///
/// Ticks are serialized: a tick's fan-out is awaited before the next one
/// starts, and ticks missed while a slow fan-out was in flight are skipped
/// rather than replayed in a burst. Each fan-out is bounded by the
/// per-recipient send timeout.
pub async fn run(state: Arc<AppState>, mut source: Box<dyn TelemetrySource>) {
    let mut tick = tokio::time::interval(state.config.broadcast.interval());
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        interval_ms = state.config.broadcast.interval_ms,
        source = source.name(),
        "broadcast ticker started"
    );

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,

            _ = tick.tick() => {
                let Some(reading) = source.next_reading().await else {
                    debug!(source = source.name(), "no reading yet, tick skipped");
                    continue;
                };
                state.broadcaster.broadcast(&reading).await;
            }
        }
    }

    info!("broadcast ticker stopped");
}
