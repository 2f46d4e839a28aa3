//! Line protocol and command engine for BC127 Bluetooth modules.
//!
//! The module speaks a carriage-return-terminated ASCII command language and
//! answers with lines terminated by `\n\r`, finishing each exchange with an
//! `OK` or `ERROR` line. This crate turns a byte-at-a-time [`ByteChannel`]
//! into deterministic [`OpResult`]s under a timeout budget.
//!
//! # Architecture
//!
//! - [`protocol`] -- wire encoding, the line buffer, and line classification
//! - [`engine`] -- the resync step and the single exchange state machine
//!
//! [`ByteChannel`]: bc127_core::ByteChannel
//! [`OpResult`]: bc127_core::OpResult

pub mod engine;
pub mod protocol;

pub use engine::{CommandEngine, EngineConfig, Exchange, ExchangeKind, GetReply, SpeedChange};
pub use protocol::{LineBuffer, LineClass};
