//! Bc127Builder -- fluent builder for constructing [`Bc127`] instances.
//!
//! Separates configuration from construction so that callers can set up the
//! serial port and exchange timeouts before opening the link.
//!
//! # Example
//!
//! ```no_run
//! use bc127::Bc127Builder;
//! use std::time::Duration;
//!
//! # fn example() -> bc127::Result<()> {
//! let module = Bc127Builder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .baud_rate(115_200)
//!     .reset_timeout(Duration::from_millis(3000))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use bc127_core::channel::ByteChannel;
use bc127_core::clock::{Clock, SystemClock};
use bc127_core::error::{Error, Result};
use bc127_core::types::BaudRate;
use bc127_protocol::EngineConfig;
use bc127_transport::{FlowControl, SerialChannel, SerialConfig};

use crate::device::Bc127;

/// Fluent builder for [`Bc127`].
///
/// Defaults match a factory-fresh module: 9600 baud, no flow control, and
/// the stock exchange timeouts of [`EngineConfig::default`].
#[derive(Debug, Clone)]
pub struct Bc127Builder {
    serial_port: Option<String>,
    baud_rate: u32,
    flow_control: FlowControl,
    config: EngineConfig,
}

impl Bc127Builder {
    pub fn new() -> Self {
        Bc127Builder {
            serial_port: None,
            baud_rate: BaudRate::B9600.bps(),
            flow_control: FlowControl::None,
            config: EngineConfig::default(),
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Set the rate the module is currently running at (default: 9600).
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    /// Enable RTS/CTS when the handshake lines are wired.
    pub fn flow_control(mut self, flow: FlowControl) -> Self {
        self.flow_control = flow;
        self
    }

    /// Quiet period that ends a resync (default: 1000ms).
    pub fn resync_timeout(mut self, timeout: Duration) -> Self {
        self.config.resync_timeout = timeout;
        self
    }

    /// Deadline for bare commands (default: 3000ms).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    /// Deadline for `SET` and `GET` (default: 2000ms).
    pub fn param_timeout(mut self, timeout: Duration) -> Self {
        self.config.param_timeout = timeout;
        self
    }

    /// Deadline for the `Ready` banner after `RESET` (default: 2000ms).
    pub fn reset_timeout(mut self, timeout: Duration) -> Self {
        self.config.reset_timeout = timeout;
        self
    }

    /// The exchange timeouts as currently configured.
    pub fn engine_config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build a [`Bc127`] over a caller-provided channel and clock.
    ///
    /// This is the entry point for tests (pass a `MockChannel` from
    /// `bc127-test-harness`) and for links other than a local serial port.
    pub fn build_with_channel<C, K>(self, channel: C, clock: K) -> Result<Bc127<C, K>>
    where
        C: ByteChannel,
        K: Clock,
    {
        self.validate()?;
        Ok(Bc127::with_config(channel, clock, self.config))
    }

    /// Open the configured serial port and build a [`Bc127`] on it.
    pub fn build(self) -> Result<Bc127<SerialChannel, SystemClock>> {
        self.validate()?;
        let port = self
            .serial_port
            .as_deref()
            .ok_or_else(|| Error::InvalidParameter("serial port not set".into()))?;

        let serial = SerialConfig {
            baud_rate: self.baud_rate,
            flow_control: self.flow_control,
            ..Default::default()
        };
        let channel = SerialChannel::open_with_config(port, serial)?;
        Ok(Bc127::with_config(channel, SystemClock::new(), self.config))
    }

    fn validate(&self) -> Result<()> {
        BaudRate::try_from(self.baud_rate)?;
        let timeouts = [
            ("resync", self.config.resync_timeout),
            ("command", self.config.command_timeout),
            ("param", self.config.param_timeout),
            ("reset", self.config.reset_timeout),
        ];
        for (name, timeout) in timeouts {
            if timeout.is_zero() {
                return Err(Error::InvalidParameter(format!(
                    "{name} timeout must be non-zero"
                )));
            }
        }
        Ok(())
    }
}

impl Default for Bc127Builder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc127_core::types::OpResult;
    use bc127_test_harness::{MockChannel, MockClock};

    #[test]
    fn defaults() {
        let builder = Bc127Builder::new();
        assert_eq!(builder.engine_config(), &EngineConfig::default());
        assert_eq!(builder.baud_rate, 9600);
        assert!(builder.serial_port.is_none());
    }

    #[test]
    fn timeouts_reach_engine() {
        let clock = MockClock::new();
        let channel = MockChannel::new(clock.clone());
        let module = Bc127Builder::new()
            .command_timeout(Duration::from_millis(500))
            .param_timeout(Duration::from_millis(400))
            .reset_timeout(Duration::from_millis(5000))
            .resync_timeout(Duration::from_millis(50))
            .build_with_channel(channel, clock)
            .unwrap();

        let config = module.config();
        assert_eq!(config.command_timeout, Duration::from_millis(500));
        assert_eq!(config.param_timeout, Duration::from_millis(400));
        assert_eq!(config.reset_timeout, Duration::from_millis(5000));
        assert_eq!(config.resync_timeout, Duration::from_millis(50));
    }

    #[test]
    fn custom_timeouts_drive_exchanges() {
        let clock = MockClock::new();
        let channel = MockChannel::new(clock.clone());
        let mut module = Bc127Builder::new()
            .resync_timeout(Duration::from_millis(10))
            .command_timeout(Duration::from_millis(100))
            .build_with_channel(channel, clock.clone())
            .unwrap();

        assert_eq!(module.write_config().unwrap(), OpResult::Timeout);
        assert_eq!(clock.now(), 110);
    }

    #[test]
    fn zero_timeout_rejected() {
        let clock = MockClock::new();
        let result = Bc127Builder::new()
            .param_timeout(Duration::ZERO)
            .build_with_channel(MockChannel::new(clock.clone()), clock);
        match result {
            Err(Error::InvalidParameter(msg)) => assert!(msg.contains("param")),
            _ => panic!("expected InvalidParameter"),
        }
    }

    #[test]
    fn unsupported_baud_rate_rejected() {
        let clock = MockClock::new();
        let result = Bc127Builder::new()
            .baud_rate(4800)
            .build_with_channel(MockChannel::new(clock.clone()), clock);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn build_without_port_fails() {
        let result = Bc127Builder::new().build();
        match result {
            Err(Error::InvalidParameter(msg)) => assert!(msg.contains("serial port")),
            _ => panic!("expected InvalidParameter"),
        }
    }
}
