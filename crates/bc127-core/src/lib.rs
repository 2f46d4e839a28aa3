//! bc127-core: Core traits, types, and error definitions for the BC127 driver.
//!
//! This crate defines the abstractions the command engine is written against.
//! Applications and channel implementations depend on these types without
//! pulling in the protocol engine or a specific serial backend.
//!
//! # Key types
//!
//! - [`OpResult`] -- the closed set of protocol outcomes every operation returns
//! - [`ByteChannel`] -- byte-at-a-time duplex link to the module
//! - [`Clock`] -- millisecond monotonic time source
//! - [`Error`] / [`Result`] -- channel and configuration failures

pub mod channel;
pub mod clock;
pub mod error;
pub mod types;

// Re-export key types at crate root for ergonomic `use bc127_core::*`.
pub use channel::ByteChannel;
pub use clock::{Clock, SystemClock};
pub use error::{Error, Result};
pub use types::*;
