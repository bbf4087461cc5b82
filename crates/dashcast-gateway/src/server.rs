use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use dashcast_core::{config::DashcastConfig, DashcastError};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::{build_router, AppState};
use crate::http::health::GIT_SHA;
use crate::source::TelemetrySource;
use crate::ticker;

/// Bind the listening socket. Failure here is fatal for the process.
pub async fn bind(addr: SocketAddr) -> dashcast_core::Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| DashcastError::Bind { addr, source })
}

/// Bind the configured address and serve until `shutdown` is cancelled.
pub async fn serve(
    config: DashcastConfig,
    source: Box<dyn TelemetrySource>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = bind(addr).await?;
    run(listener, config, source, shutdown).await
}

/// Serve WS clients on an already bound listener and drive the broadcast
/// ticker alongside. Returns once shutdown completes.
pub async fn run(
    listener: TcpListener,
    config: DashcastConfig,
    source: Box<dyn TelemetrySource>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let local_addr = listener.local_addr().context("listener has no local address")?;
    let state = Arc::new(AppState::new(config, shutdown.clone()));
    let router = build_router(state.clone());

    let ticker = tokio::spawn(ticker::run(state.clone(), source));

    info!(git_sha = GIT_SHA, "Dashcast broadcaster listening on ws://{}", local_addr);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await;

    // serve can also end on an I/O error; stop the ticker either way
    shutdown.cancel();
    if let Err(e) = ticker.await {
        warn!(error = %e, "broadcast ticker panicked");
    }
    state.registry.clear();
    info!("Dashcast broadcaster stopped");

    served.context("server error")
}

/// Resolve on SIGINT or SIGTERM and cancel `token`.
pub async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
    token.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let err = bind(addr).await.unwrap_err();
        assert_eq!(err.code(), "BIND_FAILED");
        assert!(err.to_string().contains(&addr.to_string()));
    }
}
