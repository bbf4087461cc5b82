//! Wire format for the telemetry records pushed to dashboard clients.

pub mod telemetry;

pub use telemetry::VehicleTelemetry;
