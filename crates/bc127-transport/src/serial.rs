//! Serial port channel for module communication.
//!
//! This module provides [`SerialChannel`], which implements the
//! [`ByteChannel`] trait for USB virtual COM ports and on-board UARTs wired
//! to a BC127.
//!
//! The command engine polls rather than blocks, so the port is opened through
//! `tokio-serial`'s synchronous builder: availability comes from the driver's
//! input queue count and reads never wait on an empty queue.
//!
//! Factory-fresh modules talk at 9600 baud, 8N1, no flow control.

use std::io::{Read, Write};
use std::time::Duration;

use bc127_core::channel::ByteChannel;
use bc127_core::error::{Error, Result};
use tokio_serial::SerialPort;

/// Serial port configuration.
///
/// Defaults match a factory-fresh module:
/// - 9600 baud
/// - 8 data bits
/// - 1 stop bit
/// - No parity
/// - No flow control
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate (9600, 19200, 38400, 57600 or 115200)
    pub baud_rate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Number of stop bits (typically 1)
    pub stop_bits: StopBits,
    /// Parity checking (typically None)
    pub parity: Parity,
    /// Flow control (None unless RTS/CTS are wired)
    pub flow_control: FlowControl,
    /// Upper bound on a single read or write at the OS level
    pub io_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
            io_timeout: Duration::from_millis(100),
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Seven,
    Eight,
}

impl From<DataBits> for tokio_serial::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Seven => tokio_serial::DataBits::Seven,
            DataBits::Eight => tokio_serial::DataBits::Eight,
        }
    }
}

/// Number of stop bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for tokio_serial::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => tokio_serial::StopBits::One,
            StopBits::Two => tokio_serial::StopBits::Two,
        }
    }
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for tokio_serial::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => tokio_serial::Parity::None,
            Parity::Odd => tokio_serial::Parity::Odd,
            Parity::Even => tokio_serial::Parity::Even,
        }
    }
}

/// Flow control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for tokio_serial::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => tokio_serial::FlowControl::None,
            FlowControl::Software => tokio_serial::FlowControl::Software,
            FlowControl::Hardware => tokio_serial::FlowControl::Hardware,
        }
    }
}

fn io_error(port: &str, op: &str, e: std::io::Error) -> Error {
    tracing::error!(port = %port, error = %e, "Failed to {op}");
    if e.kind() == std::io::ErrorKind::BrokenPipe || e.kind() == std::io::ErrorKind::NotConnected {
        Error::NotConnected
    } else {
        Error::Io(e)
    }
}

/// Serial port channel to a BC127 module.
pub struct SerialChannel {
    /// The underlying serial port
    port: Option<Box<dyn SerialPort>>,
    /// Port name for logging/debugging
    port_name: String,
}

impl SerialChannel {
    /// Open a serial port at `baud_rate` with otherwise default settings.
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g., "/dev/ttyUSB0" on Linux, "COM3" on Windows)
    /// * `baud_rate` - Baud rate the module is currently configured for
    pub fn open(port: &str, baud_rate: u32) -> Result<Self> {
        let config = SerialConfig {
            baud_rate,
            ..Default::default()
        };
        Self::open_with_config(port, config)
    }

    /// Open a serial port with full configuration control.
    pub fn open_with_config(port: &str, config: SerialConfig) -> Result<Self> {
        tracing::debug!(
            port = %port,
            baud_rate = config.baud_rate,
            data_bits = ?config.data_bits,
            stop_bits = ?config.stop_bits,
            parity = ?config.parity,
            flow_control = ?config.flow_control,
            "Opening serial port"
        );

        let serial_port = tokio_serial::new(port, config.baud_rate)
            .data_bits(config.data_bits.into())
            .stop_bits(config.stop_bits.into())
            .parity(config.parity.into())
            .flow_control(config.flow_control.into())
            .timeout(config.io_timeout)
            .open()
            .map_err(|e| {
                tracing::error!(port = %port, error = %e, "Failed to open serial port");
                Error::Transport(format!("Failed to open serial port {}: {}", port, e))
            })?;

        tracing::info!(port = %port, baud_rate = config.baud_rate, "Serial port opened successfully");

        Ok(Self {
            port: Some(serial_port),
            port_name: port.to_string(),
        })
    }

    /// Get the name of the serial port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Check whether the port is still open.
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Close the port. Later calls fail with [`Error::NotConnected`].
    pub fn close(&mut self) {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.flush() {
                tracing::warn!(
                    port = %self.port_name,
                    error = %e,
                    "Failed to flush before closing (continuing anyway)"
                );
            }
            tracing::info!(port = %self.port_name, "Serial port closed");
        }
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(Error::NotConnected)
    }
}

impl ByteChannel for SerialChannel {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        let name = self.port_name.clone();
        let port = self.port_mut()?;

        tracing::trace!(port = %name, bytes = data.len(), data = ?data, "Sending data");

        port.write_all(data).map_err(|e| io_error(&name, "send data", e))?;
        port.flush().map_err(|e| io_error(&name, "flush serial port", e))?;
        Ok(())
    }

    fn is_byte_available(&mut self) -> Result<bool> {
        let name = self.port_name.clone();
        let port = self.port_mut()?;
        let queued = port.bytes_to_read().map_err(|e| {
            tracing::error!(port = %name, error = %e, "Failed to query input queue");
            Error::Transport(format!("Failed to query {}: {}", name, e))
        })?;
        Ok(queued > 0)
    }

    fn read_byte(&mut self) -> Result<u8> {
        let name = self.port_name.clone();
        let port = self.port_mut()?;
        let mut byte = [0u8; 1];
        port.read_exact(&mut byte)
            .map_err(|e| io_error(&name, "receive data", e))?;
        tracing::trace!(port = %name, byte = byte[0], "Received byte");
        Ok(byte[0])
    }

    fn reconfigure_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        let name = self.port_name.clone();
        let port = self.port_mut()?;
        port.set_baud_rate(baud_rate).map_err(|e| {
            tracing::error!(port = %name, error = %e, "Failed to change baud rate");
            Error::Transport(format!("Failed to set {} to {} baud: {}", name, baud_rate, e))
        })?;
        tracing::info!(port = %name, baud_rate, "Serial port rate changed");
        Ok(())
    }
}

impl Drop for SerialChannel {
    fn drop(&mut self) {
        if self.port.is_some() {
            tracing::debug!(port = %self.port_name, "SerialChannel dropped, closing port");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_config_default() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.flow_control, FlowControl::None);
    }

    #[test]
    fn line_settings_convert() {
        assert_eq!(
            tokio_serial::DataBits::from(DataBits::Seven),
            tokio_serial::DataBits::Seven
        );
        assert_eq!(
            tokio_serial::StopBits::from(StopBits::Two),
            tokio_serial::StopBits::Two
        );
        assert_eq!(
            tokio_serial::Parity::from(Parity::Even),
            tokio_serial::Parity::Even
        );
        assert_eq!(
            tokio_serial::FlowControl::from(FlowControl::Hardware),
            tokio_serial::FlowControl::Hardware
        );
    }

    #[test]
    fn open_missing_port_fails() {
        let result = SerialChannel::open("/dev/bc127-does-not-exist", 9600);
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
