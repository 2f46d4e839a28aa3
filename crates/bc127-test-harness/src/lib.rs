//! bc127-test-harness: Test utilities for the BC127 command engine.
//!
//! This crate provides [`MockChannel`] for deterministic testing of the
//! protocol engine without a module attached, and [`MockClock`], a manually
//! driven time source the mock channel advances while it is polled idle.
//! [`SimulatedModule`] answers commands the way a factory-fresh module would,
//! for demos and smoke tests that do not care about exact scripting.

pub mod mock_channel;
pub mod mock_clock;
pub mod simulated;

pub use mock_channel::{MockChannel, SentFrame};
pub use mock_clock::MockClock;
pub use simulated::SimulatedModule;
