//! Dashcast gateway: accepts dashboard WebSocket clients and pushes one
//! telemetry reading to all of them on every tick.

pub mod app;
pub mod http;
pub mod server;
pub mod source;
pub mod ticker;
pub mod watch;
pub mod ws;
