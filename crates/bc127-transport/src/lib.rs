//! Serial byte channel for the BC127 driver.
//!
//! [`SerialChannel`] implements the [`ByteChannel`](bc127_core::ByteChannel)
//! trait from `bc127-core` over a USB virtual COM port or a UART.
//!
//! # Example
//!
//! ```no_run
//! use bc127_transport::SerialChannel;
//! use bc127_core::ByteChannel;
//!
//! # fn example() -> bc127_core::Result<()> {
//! let mut channel = SerialChannel::open("/dev/ttyUSB0", 9600)?;
//! channel.write(b"STATUS\r")?;
//! while channel.is_byte_available()? {
//!     let _byte = channel.read_byte()?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{DataBits, FlowControl, Parity, SerialChannel, SerialConfig, StopBits};
