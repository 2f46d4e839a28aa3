//! Core types used throughout the BC127 driver.
//!
//! [`OpResult`] is the closed outcome taxonomy every engine operation
//! returns. The remaining enums are the enumerated arguments accepted by the
//! thin command layer.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Outcome of one command/response exchange with the module.
///
/// This is a value, not an error: a module that answers `ERROR` or a reply
/// that never arrives are ordinary protocol outcomes the caller branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpResult {
    /// The terminal `OK` line (or the reset banner) was observed.
    Success,
    /// The module answered with an `ER`-prefixed line.
    ModuleError,
    /// The deadline elapsed before a terminal line was classified.
    ///
    /// Ambiguous: the module may have acted on the command while its reply
    /// was lost, garbled, or late.
    Timeout,
    /// Caller-side validation failed; nothing was written to the channel.
    InvalidParam,
    /// A connection-level operation layered on the engine failed.
    ConnectError,
    /// The remote device reported a failure to a layered operation.
    RemoteError,
}

impl OpResult {
    /// Return `true` for [`OpResult::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, OpResult::Success)
    }

    /// Convert into a `Result`, for callers that prefer `?` over matching.
    ///
    /// [`Timeout`](OpResult::Timeout) maps to [`Error::Timeout`],
    /// [`InvalidParam`](OpResult::InvalidParam) to
    /// [`Error::InvalidParameter`], everything else that is not a success to
    /// [`Error::Rejected`].
    pub fn into_result(self) -> Result<()> {
        match self {
            OpResult::Success => Ok(()),
            OpResult::Timeout => Err(Error::Timeout),
            OpResult::InvalidParam => Err(Error::InvalidParameter(
                "rejected before sending".into(),
            )),
            other => Err(Error::Rejected(other)),
        }
    }
}

impl fmt::Display for OpResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OpResult::Success => "success",
            OpResult::ModuleError => "module error",
            OpResult::Timeout => "timeout",
            OpResult::InvalidParam => "invalid parameter",
            OpResult::ConnectError => "connect error",
            OpResult::RemoteError => "remote error",
        };
        write!(f, "{s}")
    }
}

/// Serial line rates the module accepts for its `BAUD` parameter.
///
/// Modeled as a closed enum so out-of-range speeds are rejected on the host
/// before anything is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaudRate {
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
}

impl BaudRate {
    /// All supported rates, slowest first.
    pub const ALL: [BaudRate; 5] = [
        BaudRate::B9600,
        BaudRate::B19200,
        BaudRate::B38400,
        BaudRate::B57600,
        BaudRate::B115200,
    ];

    /// Bits per second.
    pub fn bps(&self) -> u32 {
        match self {
            BaudRate::B9600 => 9_600,
            BaudRate::B19200 => 19_200,
            BaudRate::B38400 => 38_400,
            BaudRate::B57600 => 57_600,
            BaudRate::B115200 => 115_200,
        }
    }

    /// The numeral string written in `SET BAUD=<value>`.
    pub fn as_wire(&self) -> &'static str {
        match self {
            BaudRate::B9600 => "9600",
            BaudRate::B19200 => "19200",
            BaudRate::B38400 => "38400",
            BaudRate::B57600 => "57600",
            BaudRate::B115200 => "115200",
        }
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = Error;

    fn try_from(bps: u32) -> Result<Self> {
        BaudRate::ALL
            .into_iter()
            .find(|rate| rate.bps() == bps)
            .ok_or_else(|| Error::InvalidParameter(format!("unsupported baud rate {bps}")))
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bps", self.bps())
    }
}

/// Bluetooth Low Energy role (`BLE_ROLE` parameter).
///
/// A role change only takes effect after a write/reset cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BleRole {
    Disabled,
    Peripheral,
    Central,
}

/// Bluetooth Classic audio role (`CLASSIC_ROLE` parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassicRole {
    /// Receive audio (headphones, speaker).
    Sink,
    /// Send audio (phone, player).
    Source,
}

/// Audio transport controls for a connected A2DP/AVRCP peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCommand {
    Play,
    Pause,
    Forward,
    Back,
    VolumeUp,
    VolumeDown,
    Stop,
}

/// Error returned when a string cannot be parsed into one of the command
/// argument enums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseArgError {
    kind: &'static str,
    input: String,
}

impl fmt::Display for ParseArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: '{}'", self.kind, self.input)
    }
}

impl std::error::Error for ParseArgError {}

impl FromStr for BleRole {
    type Err = ParseArgError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "disabled" | "off" | "0" => Ok(BleRole::Disabled),
            "peripheral" | "1" => Ok(BleRole::Peripheral),
            "central" | "2" => Ok(BleRole::Central),
            _ => Err(ParseArgError {
                kind: "BLE role",
                input: s.to_string(),
            }),
        }
    }
}

impl FromStr for ClassicRole {
    type Err = ParseArgError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sink" => Ok(ClassicRole::Sink),
            "source" => Ok(ClassicRole::Source),
            _ => Err(ParseArgError {
                kind: "classic role",
                input: s.to_string(),
            }),
        }
    }
}

impl FromStr for AudioCommand {
    type Err = ParseArgError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "play" => Ok(AudioCommand::Play),
            "pause" => Ok(AudioCommand::Pause),
            "forward" | "next" => Ok(AudioCommand::Forward),
            "back" | "previous" => Ok(AudioCommand::Back),
            "up" | "volume-up" => Ok(AudioCommand::VolumeUp),
            "down" | "volume-down" => Ok(AudioCommand::VolumeDown),
            "stop" => Ok(AudioCommand::Stop),
            _ => Err(ParseArgError {
                kind: "audio command",
                input: s.to_string(),
            }),
        }
    }
}
