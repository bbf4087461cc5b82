use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Utf8Bytes;
use dashcast_core::types::ConnId;
use dashcast_protocol::VehicleTelemetry;
use futures_util::future::join_all;
use tokio::sync::mpsc::error::SendTimeoutError;
use tracing::{debug, warn};

use crate::ws::registry::ConnectionRegistry;

/// Outcome of one broadcast tick. Informational only; a tick never fails.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Members in the snapshot the tick was sent to.
    pub recipients: usize,
    pub delivered: usize,
    /// Connections that could not take the payload and were unregistered.
    pub dropped: Vec<ConnId>,
}

/// Fan-out of telemetry readings to every registered client.
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    send_timeout: Duration,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>, send_timeout: Duration) -> Self {
        Self {
            registry,
            send_timeout,
        }
    }

    /// Serialize `reading` once and hand it to every member concurrently.
    ///
    /// A member whose queue is closed, or stays full for longer than the
    /// send timeout, is unregistered. Other members are unaffected.
    pub async fn broadcast(&self, reading: &VehicleTelemetry) -> BroadcastReport {
        if self.registry.is_empty() {
            return BroadcastReport::default();
        }

        let text = match reading.to_json() {
            Ok(json) => Utf8Bytes::from(json),
            Err(e) => {
                warn!(error = %e, "failed to serialize reading, tick skipped");
                return BroadcastReport::default();
            }
        };

        let recipients = self.registry.snapshot();
        let total = recipients.len();
        let timeout = self.send_timeout;

        let sends = recipients.into_iter().map(|(id, tx)| {
            let payload = text.clone();
            async move {
                let result = tx.send_timeout(payload, timeout).await;
                (id, result)
            }
        });

        let mut report = BroadcastReport {
            recipients: total,
            ..Default::default()
        };
        for (id, result) in join_all(sends).await {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    let reason = match e {
                        SendTimeoutError::Timeout(_) => "send timed out",
                        SendTimeoutError::Closed(_) => "connection closed",
                    };
                    warn!(conn_id = %id, reason, "dropping client after failed delivery");
                    self.registry.unregister(&id);
                    report.dropped.push(id);
                }
            }
        }

        debug!(
            recipients = report.recipients,
            delivered = report.delivered,
            dropped = report.dropped.len(),
            "broadcast tick"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::registry::Outbound;
    use tokio::sync::mpsc;

    const SAMPLE_WIRE: &str =
        r#"{"fuelIn":45.5,"fuelOut":2.3,"gear":3,"rpm":2500,"speed":65,"mileage":14.2}"#;

    fn setup() -> (Arc<ConnectionRegistry>, Broadcaster) {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Broadcaster::new(registry.clone(), Duration::from_millis(50));
        (registry, broadcaster)
    }

    fn client(
        registry: &ConnectionRegistry,
        name: &str,
        queue: usize,
    ) -> (ConnId, Outbound, mpsc::Receiver<Utf8Bytes>) {
        let (tx, rx) = mpsc::channel(queue);
        let id = ConnId::from(name);
        registry.register(id.clone(), tx.clone());
        (id, tx, rx)
    }

    #[tokio::test]
    async fn empty_registry_sends_nothing() {
        let (_registry, broadcaster) = setup();
        let report = broadcaster.broadcast(&VehicleTelemetry::sample()).await;
        assert_eq!(report, BroadcastReport::default());
        assert_eq!(report.recipients, 0);
    }

    #[tokio::test]
    async fn three_clients_each_get_one_copy() {
        let (registry, broadcaster) = setup();
        let mut receivers = Vec::new();
        for name in ["a", "b", "c"] {
            let (_, _, rx) = client(&registry, name, 4);
            receivers.push(rx);
        }

        let report = broadcaster.broadcast(&VehicleTelemetry::sample()).await;
        assert_eq!(report.recipients, 3);
        assert_eq!(report.delivered, 3);
        assert!(report.dropped.is_empty());

        for rx in receivers.iter_mut() {
            assert_eq!(rx.try_recv().unwrap().as_str(), SAMPLE_WIRE);
            assert!(rx.try_recv().is_err(), "exactly one copy per tick");
        }
    }

    #[tokio::test]
    async fn closed_client_is_dropped_others_still_receive() {
        let (registry, broadcaster) = setup();
        let (_, _, mut rx_a) = client(&registry, "a", 4);
        let (dead, _, rx_dead) = client(&registry, "dead", 4);
        let (_, _, mut rx_c) = client(&registry, "c", 4);
        drop(rx_dead);

        let report = broadcaster.broadcast(&VehicleTelemetry::sample()).await;
        assert_eq!(report.recipients, 3);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.dropped, vec![dead.clone()]);
        assert!(!registry.contains(&dead));
        assert_eq!(registry.len(), 2);

        assert_eq!(rx_a.try_recv().unwrap().as_str(), SAMPLE_WIRE);
        assert_eq!(rx_c.try_recv().unwrap().as_str(), SAMPLE_WIRE);
    }

    #[tokio::test]
    async fn stalled_client_does_not_block_others() {
        let (registry, broadcaster) = setup();
        let (slow, slow_tx, _rx_slow) = client(&registry, "slow", 1);
        // fill the slow client's queue so the next send has to wait
        slow_tx.try_send(Utf8Bytes::from("backlog")).unwrap();
        let (_, _, mut rx_fast) = client(&registry, "fast", 4);

        let report = broadcaster.broadcast(&VehicleTelemetry::sample()).await;
        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped, vec![slow.clone()]);
        assert!(!registry.contains(&slow));
        assert_eq!(rx_fast.try_recv().unwrap().as_str(), SAMPLE_WIRE);
    }

    #[tokio::test]
    async fn dropped_client_is_not_sent_next_tick() {
        let (registry, broadcaster) = setup();
        let (_, _, rx_dead) = client(&registry, "dead", 4);
        let (_, _, mut rx_live) = client(&registry, "live", 4);
        drop(rx_dead);

        broadcaster.broadcast(&VehicleTelemetry::sample()).await;
        let second = broadcaster.broadcast(&VehicleTelemetry::sample()).await;
        assert_eq!(second.recipients, 1);
        assert_eq!(second.delivered, 1);

        assert!(rx_live.try_recv().is_ok());
        assert!(rx_live.try_recv().is_ok());
    }
}
