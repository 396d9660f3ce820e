//! Hyperliquid venue access for the ladder market maker.
//!
//! - `InfoClient`: read-only info endpoint client
//! - `PaperGateway`: live market data, simulated order book-keeping

pub mod client;
pub mod config;
pub mod error;
pub mod paper;

pub use client::{InfoClient, PerpAccount};
pub use config::VenueConfig;
pub use error::{VenueError, VenueResult};
pub use paper::PaperGateway;
