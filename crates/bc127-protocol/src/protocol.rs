//! Wire encoding and line decoding for the BC127 command language.
//!
//! Outgoing lines are terminated by a single carriage return. Incoming lines
//! are terminated by the two-byte sequence `\n\r`, newline first. Every
//! exchange ends with a status line whose first two bytes decide the outcome:
//! `OK` for success, `ER` for an error, or `Re` for the `Ready` banner that
//! concludes a reset.

use bytes::BytesMut;

/// Terminates every line sent to the module.
pub const COMMAND_TERMINATOR: u8 = b'\r';

/// Terminates every line received from the module.
pub const EOL: &[u8] = b"\n\r";

/// Written before each exchange to flush a half-entered command.
pub const RESYNC_PROBE: &[u8] = b"\r";

/// Status prefix of a successful exchange.
pub const OK_PREFIX: &[u8] = b"OK";

/// Status prefix of a rejected command (`ERROR`).
pub const ERROR_PREFIX: &[u8] = b"ER";

/// First line prefix of the boot banner's final `Ready` line.
pub const READY_PREFIX: &[u8] = b"Re";

/// Typical longest line the module emits; the buffer grows past it if needed.
const LINE_CAPACITY: usize = 128;

/// Encode a bare command: `<TOKEN>\r`.
pub fn encode_command(token: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(token.len() + 1);
    out.extend_from_slice(token.as_bytes());
    out.push(COMMAND_TERMINATOR);
    out
}

/// Encode a parameter write: `SET <NAME>=<VALUE>\r`.
pub fn encode_set(name: &str, value: &str) -> Vec<u8> {
    encode_command(&format!("SET {name}={value}"))
}

/// Encode a parameter read: `GET <NAME>\r`.
pub fn encode_get(name: &str) -> Vec<u8> {
    encode_command(&format!("GET {name}"))
}

/// Bytes received since the last line terminator.
///
/// Always a prefix of the line the module is currently sending. The engine
/// clears it after every completed line, whether or not the line mattered.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: BytesMut,
}

impl LineBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        LineBuffer {
            buf: BytesMut::with_capacity(LINE_CAPACITY),
        }
    }

    /// Append one received byte.
    pub fn push(&mut self, byte: u8) {
        self.buf.extend_from_slice(&[byte]);
    }

    /// `true` once the buffer ends with [`EOL`].
    pub fn is_complete(&self) -> bool {
        self.buf.ends_with(EOL)
    }

    /// The raw line, terminator included when complete.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// The line without its terminator, lossily decoded for logging.
    pub fn text(&self) -> String {
        let body = self.buf.strip_suffix(EOL).unwrap_or(&self.buf[..]);
        String::from_utf8_lossy(body).into_owned()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Discard the current line.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

/// What a completed line means to the exchange in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// An `ER`-prefixed status line.
    Error,
    /// The exchange's success line (`OK`, or `Re` for a reset).
    Success,
    /// The echoed parameter of a get, with its value extracted.
    Value(String),
    /// Anything else: informational output to be skipped.
    Other,
}

/// Classify one completed line.
///
/// The error prefix is checked first, then `success_prefix`, then, when
/// `capture` names a parameter, whether the line starts with that name.
pub fn classify_line(line: &[u8], success_prefix: &[u8], capture: Option<&str>) -> LineClass {
    if line.starts_with(ERROR_PREFIX) {
        return LineClass::Error;
    }
    if line.starts_with(success_prefix) {
        return LineClass::Success;
    }
    match capture {
        Some(name) if line.starts_with(name.as_bytes()) => {
            LineClass::Value(extract_value(line, name))
        }
        _ => LineClass::Other,
    }
}

/// Extract the value from a `<NAME>=<VALUE>\n\r` line.
///
/// Skips the name and the one separator byte after it, then trims
/// surrounding whitespace (which also removes the terminator). A line too
/// short to hold a value yields an empty string.
pub fn extract_value(line: &[u8], name: &str) -> String {
    let rest = line.get(name.len() + 1..).unwrap_or_default();
    String::from_utf8_lossy(rest).trim().to_string()
}
