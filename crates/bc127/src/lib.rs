//! Host-side driver for BC127 Bluetooth audio modules.
//!
//! The BC127 (Melody firmware) is controlled over a UART with a text command
//! language: the host writes a carriage-return-terminated line and the module
//! answers with `\n\r`-terminated lines ending in `OK` or `ERROR`. This crate
//! provides:
//!
//! - **Command table** ([`commands`]) -- the exchanges behind each module
//!   feature (BLE role, classic role, advertising, audio transport, reset).
//! - **Driver** ([`device`]) -- [`Bc127`], a synchronous handle that runs
//!   those exchanges through the `bc127-protocol` command engine.
//! - **Builder** ([`builder`]) -- [`Bc127Builder`] for serial settings and
//!   timeouts.
//! - **Async facade** ([`io`]) -- [`Bc127Io`], which moves the driver onto a
//!   dedicated blocking worker and serializes requests from async callers.
//!
//! # Example
//!
//! ```no_run
//! use bc127::{Bc127Builder, BleRole};
//!
//! # fn example() -> bc127::Result<()> {
//! let mut module = Bc127Builder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .baud_rate(9600)
//!     .build()?;
//!
//! module.set_ble_role(BleRole::Peripheral)?.into_result()?;
//! module.write_config()?.into_result()?;
//! module.reset()?.into_result()?;
//!
//! if let Some(addr) = module.address_query()?.into_value() {
//!     println!("local address: {addr}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Speed changes
//!
//! [`Bc127::set_baud_rate`] returns a [`SpeedChange`]. The module switches
//! rate the moment it accepts the command, so its acknowledgment usually
//! arrives garbled and the exchange times out. Check
//! [`SpeedChange::is_unconfirmed`], follow with
//! [`Bc127::follow_baud_rate`], and verify with [`Bc127::baud_rate_query`].

pub mod builder;
pub mod commands;
pub mod device;
pub mod io;

pub use bc127_core::*;
pub use bc127_protocol::{EngineConfig, Exchange, GetReply, SpeedChange};
pub use builder::Bc127Builder;
pub use device::Bc127;
pub use io::Bc127Io;
