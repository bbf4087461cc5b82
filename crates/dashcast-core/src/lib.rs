//! Shared building blocks for the Dashcast broadcaster: configuration,
//! error taxonomy and connection identity.

pub mod config;
pub mod error;
pub mod types;

pub use error::{DashcastError, Result};
