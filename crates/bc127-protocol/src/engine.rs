//! The command engine: resync plus one parameterized exchange state machine.
//!
//! Every operation follows the same shape. Flush whatever the module was in
//! the middle of saying ([`CommandEngine::resync`]), write one command line,
//! then poll the channel byte by byte, classifying each completed line until
//! a terminal status line arrives or the deadline passes.
//!
//! The engine owns no thread and no buffer beyond the line being assembled.
//! It is not reentrant: one exchange at a time per channel. The async
//! `Bc127Io` facade in the `bc127` crate enforces that for concurrent callers.

use std::time::Duration;

use tracing::{debug, trace, warn};

use bc127_core::channel::ByteChannel;
use bc127_core::clock::Clock;
use bc127_core::error::Result;
use bc127_core::types::{BaudRate, OpResult};

use crate::protocol::{self, LineBuffer, LineClass};

/// Parameter that selects the module's serial line rate.
pub const BAUD_PARAM: &str = "BAUD";

/// Command that reboots the module.
pub const RESET_COMMAND: &str = "RESET";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Timeouts for the engine's exchanges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long resync waits for the next byte before giving up. Restarts on
    /// every received byte.
    pub resync_timeout: Duration,
    /// Absolute deadline for a bare command, measured from the write.
    pub command_timeout: Duration,
    /// Absolute deadline for `SET` and `GET` exchanges.
    pub param_timeout: Duration,
    /// Absolute deadline for `RESET` to print its `Ready` banner.
    pub reset_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            resync_timeout: Duration::from_millis(1000),
            command_timeout: Duration::from_millis(3000),
            param_timeout: Duration::from_millis(2000),
            reset_timeout: Duration::from_millis(2000),
        }
    }
}

// ---------------------------------------------------------------------------
// Exchange description
// ---------------------------------------------------------------------------

/// The shape of an exchange, which fixes its deadline and success line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeKind {
    Command,
    Set,
    Get,
    Reset,
}

impl ExchangeKind {
    /// Deadline for this kind of exchange under `config`.
    pub fn deadline(&self, config: &EngineConfig) -> Duration {
        match self {
            ExchangeKind::Command => config.command_timeout,
            ExchangeKind::Set | ExchangeKind::Get => config.param_timeout,
            ExchangeKind::Reset => config.reset_timeout,
        }
    }

    /// Prefix of the line that ends this exchange successfully.
    pub fn success_prefix(&self) -> &'static [u8] {
        match self {
            ExchangeKind::Reset => protocol::READY_PREFIX,
            _ => protocol::OK_PREFIX,
        }
    }
}

/// One command line to write and how to interpret the reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    payload: Vec<u8>,
    kind: ExchangeKind,
    capture: Option<String>,
}

impl Exchange {
    /// `<TOKEN>\r`, answered by `OK` or `ERROR`.
    pub fn command(token: &str) -> Self {
        Exchange {
            payload: protocol::encode_command(token),
            kind: ExchangeKind::Command,
            capture: None,
        }
    }

    /// `SET <NAME>=<VALUE>\r`, answered by `OK` or `ERROR`.
    pub fn set(name: &str, value: &str) -> Self {
        Exchange {
            payload: protocol::encode_set(name, value),
            kind: ExchangeKind::Set,
            capture: None,
        }
    }

    /// `GET <NAME>\r`, answered by `<NAME>=<VALUE>` and then `OK` or `ERROR`.
    pub fn get(name: &str) -> Self {
        Exchange {
            payload: protocol::encode_get(name),
            kind: ExchangeKind::Get,
            capture: Some(name.to_string()),
        }
    }

    /// `RESET\r`, answered by the boot banner ending in `Ready`.
    pub fn reset() -> Self {
        Exchange {
            payload: protocol::encode_command(RESET_COMMAND),
            kind: ExchangeKind::Reset,
            capture: None,
        }
    }

    pub fn kind(&self) -> ExchangeKind {
        self.kind
    }

    /// The exact bytes this exchange writes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of a `GET` exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetReply {
    pub result: OpResult,
    /// The last value line seen during the exchange, if any.
    ///
    /// Only trustworthy when `result` is [`OpResult::Success`]; see
    /// [`into_value`](Self::into_value).
    pub value: Option<String>,
}

impl GetReply {
    /// The value, if the exchange succeeded.
    pub fn into_value(self) -> Option<String> {
        match self.result {
            OpResult::Success => self.value,
            _ => None,
        }
    }
}

/// Outcome of a module speed change.
///
/// The module switches rate as soon as it accepts `SET BAUD=...`, so its
/// `OK` usually goes out at the new rate and arrives as noise. A
/// [`Timeout`](OpResult::Timeout) here therefore most likely means the change
/// took effect, but nothing on the wire can confirm it. Callers decide:
/// [`is_unconfirmed`](Self::is_unconfirmed) flags exactly that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedChange {
    /// The rate the caller asked for, in bits per second.
    pub requested_bps: u32,
    pub result: OpResult,
}

impl SpeedChange {
    /// The module acknowledged at the old rate (it was already at the
    /// requested one, or the acknowledgment survived).
    pub fn is_confirmed(&self) -> bool {
        self.result.is_success()
    }

    /// The exchange timed out: likely applied, not verifiable.
    pub fn is_unconfirmed(&self) -> bool {
        self.result == OpResult::Timeout
    }

    /// The requested rate, if it was one the module supports.
    pub fn rate(&self) -> Option<BaudRate> {
        BaudRate::try_from(self.requested_bps).ok()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Drives command/response exchanges over a [`ByteChannel`].
pub struct CommandEngine<C, K> {
    channel: C,
    clock: K,
    config: EngineConfig,
}

impl<C: ByteChannel, K: Clock> CommandEngine<C, K> {
    /// Create an engine with the default timeouts.
    pub fn new(channel: C, clock: K) -> Self {
        Self::with_config(channel, clock, EngineConfig::default())
    }

    pub fn with_config(channel: C, clock: K, config: EngineConfig) -> Self {
        CommandEngine {
            channel,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    /// Give back the channel and clock.
    pub fn into_parts(self) -> (C, K) {
        (self.channel, self.clock)
    }

    /// Bring the module to a known start.
    ///
    /// Writes a bare carriage return, which terminates any half-entered
    /// command, then discards input up to and including the next complete
    /// line. Returns [`OpResult::Success`] as soon as a terminator is seen,
    /// whatever the line said, or [`OpResult::Timeout`] once the resync
    /// window passes with no byte received. Each received byte restarts the
    /// window, so a slow stale line is not mistaken for silence.
    pub fn resync(&mut self) -> Result<OpResult> {
        trace!("writing resync probe");
        self.channel.write(protocol::RESYNC_PROBE)?;

        let window = millis(self.config.resync_timeout);
        let mut line = LineBuffer::new();
        let mut last_rx = self.clock.now_millis();

        loop {
            if self.channel.is_byte_available()? {
                line.push(self.channel.read_byte()?);
                last_rx = self.clock.now_millis();
                if line.is_complete() {
                    debug!(line = %line.text(), "resync flushed line");
                    return Ok(OpResult::Success);
                }
            }
            if self.clock.now_millis().wrapping_sub(last_rx) >= window {
                debug!(
                    partial = %line.text(),
                    window_ms = window,
                    "resync saw no terminator"
                );
                return Ok(OpResult::Timeout);
            }
        }
    }

    /// Run one exchange: resync, write, then classify lines until a status
    /// line or the deadline.
    ///
    /// A failed resync is logged and the exchange proceeds anyway; the
    /// command's own status line still decides the outcome. Channel failures
    /// are returned as `Err`, protocol outcomes as `Ok`.
    pub fn run(&mut self, exchange: Exchange) -> Result<GetReply> {
        if self.resync()? == OpResult::Timeout {
            warn!("resync timed out; issuing command without a known start");
        }

        let limit = millis(exchange.kind.deadline(&self.config));
        let success_prefix = exchange.kind.success_prefix();
        let command = String::from_utf8_lossy(&exchange.payload);
        let command = command.trim_end();

        debug!(command = %command, kind = ?exchange.kind, "issuing command");
        self.channel.write(&exchange.payload)?;
        let start = self.clock.now_millis();

        let mut line = LineBuffer::new();
        let mut value = None;

        let result = loop {
            let elapsed = self.clock.now_millis().wrapping_sub(start);
            if elapsed >= limit {
                break OpResult::Timeout;
            }
            if !self.channel.is_byte_available()? {
                continue;
            }
            line.push(self.channel.read_byte()?);
            if !line.is_complete() {
                continue;
            }

            let class = protocol::classify_line(
                line.as_bytes(),
                success_prefix,
                exchange.capture.as_deref(),
            );
            trace!(line = %line.text(), class = ?class, "received line");
            match class {
                LineClass::Error => break OpResult::ModuleError,
                LineClass::Success => break OpResult::Success,
                LineClass::Value(v) => value = Some(v),
                LineClass::Other => {}
            }
            line.clear();
        };

        debug!(
            command = %command,
            result = ?result,
            elapsed_ms = self.clock.now_millis().wrapping_sub(start),
            "exchange finished"
        );
        Ok(GetReply { result, value })
    }

    /// Send a bare command and wait for `OK` or `ERROR`.
    pub fn command(&mut self, token: &str) -> Result<OpResult> {
        Ok(self.run(Exchange::command(token))?.result)
    }

    /// Write a parameter with `SET <name>=<value>`.
    pub fn set_param(&mut self, name: &str, value: &str) -> Result<OpResult> {
        Ok(self.run(Exchange::set(name, value))?.result)
    }

    /// Read a parameter with `GET <name>`.
    ///
    /// The value is captured from the echoed `<name>=<value>` line, but the
    /// exchange only completes on the status line that follows it.
    pub fn get_param(&mut self, name: &str) -> Result<GetReply> {
        self.run(Exchange::get(name))
    }

    /// Reboot the module and wait for its `Ready` banner.
    pub fn reset(&mut self) -> Result<OpResult> {
        Ok(self.run(Exchange::reset())?.result)
    }

    /// Ask the module to switch its serial rate.
    ///
    /// Rates other than the five the module supports are rejected with
    /// [`OpResult::InvalidParam`] before anything is written. See
    /// [`SpeedChange`] for why a timeout here is not a plain failure.
    pub fn change_speed(&mut self, bps: u32) -> Result<SpeedChange> {
        let Ok(rate) = BaudRate::try_from(bps) else {
            debug!(bps, "rejecting unsupported baud rate");
            return Ok(SpeedChange {
                requested_bps: bps,
                result: OpResult::InvalidParam,
            });
        };

        let result = self.set_param(BAUD_PARAM, rate.as_wire())?;
        if result == OpResult::Timeout {
            warn!(
                bps,
                "no acknowledgment for speed change; the module has likely switched rate"
            );
        }
        Ok(SpeedChange {
            requested_bps: bps,
            result,
        })
    }
}
