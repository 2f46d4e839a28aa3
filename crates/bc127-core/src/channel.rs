//! Byte channel trait for module communication.
//!
//! The [`ByteChannel`] trait abstracts over the serial link to the module.
//! It is deliberately minimal: a non-blocking availability check, a
//! single-byte read, and a write. There is no framing at this layer; the
//! command engine in `bc127-protocol` assembles lines itself.
//!
//! Implementations exist for real serial ports (`bc127-transport`) and for
//! scripted testing (`MockChannel` in `bc127-test-harness`).

use crate::error::Result;

/// Synchronous, byte-oriented duplex link to a BC127 module.
pub trait ByteChannel {
    /// Write all of `data` to the module.
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Return whether at least one received byte is ready to read.
    ///
    /// Must not block.
    fn is_byte_available(&mut self) -> Result<bool>;

    /// Read one received byte.
    ///
    /// Only valid after [`is_byte_available`](Self::is_byte_available)
    /// returned `true`; implementations may fail otherwise.
    fn read_byte(&mut self) -> Result<u8>;

    /// Change the host-side line rate to follow a module speed change.
    ///
    /// Channels without a configurable line rate accept and ignore this.
    fn reconfigure_baud_rate(&mut self, _baud_rate: u32) -> Result<()> {
        Ok(())
    }
}

impl<T: ByteChannel + ?Sized> ByteChannel for Box<T> {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn is_byte_available(&mut self) -> Result<bool> {
        (**self).is_byte_available()
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn reconfigure_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        (**self).reconfigure_baud_rate(baud_rate)
    }
}
