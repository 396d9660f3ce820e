//! Tiered-ladder market maker.
//!
//! Wires the quoting engine to a venue gateway:
//! - Configuration loading and validation
//! - Observation-mode gateway against the Hyperliquid info API
//! - Strategy loop with per-cycle metrics
//! - Prometheus exporter and graceful shutdown

pub mod app;
pub mod config;
pub mod error;

pub use app::{record_cycle, Application};
pub use config::{AppConfig, TelemetryConfig};
pub use error::{AppError, AppResult};
