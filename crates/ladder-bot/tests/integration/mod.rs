//! Integration tests for ladder-bot.
//!
//! These drive the whole application against an in-memory gateway:
//! - Config file loading
//! - Ladder placement under inventory limits
//! - Steady state and shutdown

pub mod common;
