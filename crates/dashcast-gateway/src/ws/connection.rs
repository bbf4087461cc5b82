use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use dashcast_core::{config::CLOSE_TIMEOUT_MS, types::ConnId};
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::app::AppState;

/// Axum handler: upgrades HTTP to WebSocket at GET / and GET /ws.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| run_connection(socket, state))
}

/// Per-connection task. Lives until the peer closes, a write fails or
/// stalls, the broadcaster drops this client, or the server shuts down.
async fn run_connection(socket: WebSocket, state: Arc<AppState>) {
    let conn_id = ConnId::new();
    let (tx, mut outbound) = mpsc::channel(state.config.broadcast.client_queue);
    state.registry.register(conn_id.clone(), tx);
    info!(conn_id = %conn_id, clients = state.registry.len(), "client connected");

    let (mut sink, mut stream) = socket.split();
    let write_timeout = state.config.broadcast.send_timeout();

    let reason = loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => {
                let frame = CloseFrame {
                    code: close_code::AWAY,
                    reason: "server shutting down".into(),
                };
                let close_timeout = Duration::from_millis(CLOSE_TIMEOUT_MS);
                let _ = write_frame(&mut sink, Message::Close(Some(frame)), close_timeout).await;
                break "server shutdown";
            }

            payload = outbound.recv() => match payload {
                Some(text) => {
                    if let Err(e) = write_frame(&mut sink, Message::Text(text), write_timeout).await {
                        debug!(conn_id = %conn_id, error = %e, "socket write failed");
                        break e.reason();
                    }
                }
                // registry let go of us after a failed delivery
                None => break "dropped by broadcaster",
            },

            inbound = stream.next() => match inbound {
                Some(Ok(Message::Close(_))) | None => break "peer closed",
                Some(Err(e)) => {
                    debug!(conn_id = %conn_id, error = %e, "socket read failed");
                    break "read failed";
                }
                // clients have nothing to say; pings are answered by the socket
                Some(Ok(_)) => {}
            },
        }
    };

    state.registry.unregister(&conn_id);
    info!(conn_id = %conn_id, reason, clients = state.registry.len(), "client disconnected");
}

#[derive(Debug)]
enum WriteError {
    Failed(String),
    TimedOut,
}

impl WriteError {
    fn reason(&self) -> &'static str {
        match self {
            WriteError::Failed(_) => "write failed",
            WriteError::TimedOut => "write timed out",
        }
    }
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteError::Failed(e) => write!(f, "{e}"),
            WriteError::TimedOut => f.write_str("peer stopped reading"),
        }
    }
}

/// Write one frame, giving up after `limit`. A peer that keeps its socket
/// open but never reads would otherwise park this task forever.
async fn write_frame<S>(sink: &mut S, msg: Message, limit: Duration) -> Result<(), WriteError>
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    match tokio::time::timeout(limit, sink.send(msg)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(WriteError::Failed(e.to_string())),
        Err(_) => Err(WriteError::TimedOut),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Sink whose peer never drains: every send stays pending.
    struct StalledPeer;

    impl Sink<Message> for StalledPeer {
        type Error = axum::Error;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Pending
        }

        fn start_send(self: Pin<&mut Self>, _item: Message) -> Result<(), Self::Error> {
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Pending
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Pending
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_peer_write_times_out() {
        let mut sink = StalledPeer;
        let err = write_frame(&mut sink, Message::Text("x".into()), Duration::from_millis(250))
            .await
            .unwrap_err();
        assert!(matches!(err, WriteError::TimedOut));
        assert_eq!(err.reason(), "write timed out");
    }

    #[tokio::test]
    async fn ready_peer_write_succeeds() {
        let mut sink = futures_util::sink::drain().sink_map_err(|_| axum::Error::new("drain"));
        write_frame(&mut sink, Message::Text("x".into()), Duration::from_millis(250))
            .await
            .unwrap();
    }
}
