use axum::{routing::get, Router};
use dashcast_core::config::DashcastConfig;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::ws::{broadcast::Broadcaster, registry::ConnectionRegistry};

/// Central shared state, passed as Arc<AppState> to all Axum handlers and
/// the broadcast ticker.
pub struct AppState {
    pub config: DashcastConfig,
    /// Open WS connections: conn_id -> outbound queue.
    pub registry: Arc<ConnectionRegistry>,
    pub broadcaster: Broadcaster,
    /// Cancelled once on shutdown; every long-lived task selects on it.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: DashcastConfig, shutdown: CancellationToken) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Broadcaster::new(registry.clone(), config.broadcast.send_timeout());
        Self {
            config,
            registry,
            broadcaster,
            shutdown,
        }
    }
}

/// Assemble the Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(crate::ws::connection::ws_handler))
        .route("/ws", get(crate::ws::connection::ws_handler))
        .route("/health", get(crate::http::health::health_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
