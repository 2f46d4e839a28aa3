//! Mock byte channel for deterministic testing of the command engine.
//!
//! [`MockChannel`] implements [`ByteChannel`] with pre-loaded
//! request/response pairs, injectable stale bytes, and time-scheduled
//! deliveries driven by a shared [`MockClock`].
//!
//! Every poll of [`is_byte_available`](ByteChannel::is_byte_available) that
//! finds nothing due advances the clock by one millisecond. An engine spinning
//! on an idle channel therefore walks simulated time forward one tick per
//! poll, which makes deadlines land on exact, repeatable values.
//!
//! # Example
//!
//! ```
//! use bc127_test_harness::{MockChannel, MockClock};
//!
//! let clock = MockClock::new();
//! let mut channel = MockChannel::new(clock.clone());
//! // The resync probe is answered with an error line, which flushes cleanly.
//! channel.expect(b"\r", b"ERROR\n\r");
//! channel.expect(b"WRITE\r", b"OK\n\r");
//! ```

use std::collections::VecDeque;

use bc127_core::channel::ByteChannel;
use bc127_core::error::{Error, Result};

use crate::mock_clock::MockClock;

/// Simulated time that passes for every empty poll.
const IDLE_TICK_MS: u64 = 1;

/// A pre-loaded request/response pair.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be written.
    request: Vec<u8>,
    /// Bytes the module sends back, or nothing for a silent module.
    response: Vec<u8>,
    /// How long after the write the response becomes readable.
    delay_ms: u64,
}

/// One recorded `write()` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    /// Simulated time of the write.
    pub at_ms: u64,
    /// The bytes written.
    pub data: Vec<u8>,
}

type Responder = Box<dyn FnMut(&[u8]) -> Option<Vec<u8>> + Send>;

/// A mock [`ByteChannel`] for testing the engine without hardware.
///
/// Expectations are consumed in order. A write that does not match the next
/// expectation fails with [`Error::Transport`]. Once the queue is empty,
/// writes go to the fallback responder if one is installed; otherwise they
/// are recorded and the simulated module stays silent.
pub struct MockChannel {
    clock: MockClock,
    expectations: VecDeque<Expectation>,
    /// Bytes in flight towards the host, tagged with the time they arrive.
    inbound: VecDeque<(u64, u8)>,
    responder: Option<Responder>,
    sent_log: Vec<SentFrame>,
    connected: bool,
    fail_writes: bool,
    baud_rate: Option<u32>,
}

impl MockChannel {
    /// Create a connected mock channel driven by `clock`.
    pub fn new(clock: MockClock) -> Self {
        MockChannel {
            clock,
            expectations: VecDeque::new(),
            inbound: VecDeque::new(),
            responder: None,
            sent_log: Vec::new(),
            connected: true,
            fail_writes: false,
            baud_rate: None,
        }
    }

    /// Add an expected write and the response that immediately follows it.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expect_delayed(request, response, 0);
    }

    /// Add an expected write whose response arrives `delay_ms` later.
    pub fn expect_delayed(&mut self, request: &[u8], response: &[u8], delay_ms: u64) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
            delay_ms,
        });
    }

    /// Add an expected write that the module never answers.
    pub fn expect_silent(&mut self, request: &[u8]) {
        self.expect_delayed(request, b"", 0);
    }

    /// Make `bytes` readable right now, as if left over from an earlier
    /// exchange.
    pub fn inject(&mut self, bytes: &[u8]) {
        let now = self.clock.now();
        self.schedule(now, bytes);
    }

    /// Make `bytes` readable at absolute simulated time `at_ms`.
    pub fn inject_at(&mut self, at_ms: u64, bytes: &[u8]) {
        self.schedule(at_ms, bytes);
    }

    /// Answer writes through `responder` once the expectation queue is empty.
    ///
    /// The responder returns the bytes to send back, or `None` to stay
    /// silent.
    pub fn set_responder<F>(&mut self, responder: F)
    where
        F: FnMut(&[u8]) -> Option<Vec<u8>> + Send + 'static,
    {
        self.responder = Some(Box::new(responder));
    }

    /// Return all writes recorded so far, oldest first.
    pub fn sent_frames(&self) -> &[SentFrame] {
        &self.sent_log
    }

    /// Return the bytes of every recorded write.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.sent_log.iter().map(|f| f.data.clone()).collect()
    }

    /// Total number of bytes written across all writes.
    pub fn bytes_written(&self) -> usize {
        self.sent_log.iter().map(|f| f.data.len()).sum()
    }

    /// Return the number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Number of bytes scheduled for the host but not yet read, due or not.
    pub fn pending_bytes(&self) -> usize {
        self.inbound.len()
    }

    /// Make subsequent writes fail with [`Error::Transport`].
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Set the connected state; a disconnected channel fails every call with
    /// [`Error::NotConnected`].
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// The last rate passed to
    /// [`reconfigure_baud_rate`](ByteChannel::reconfigure_baud_rate).
    pub fn baud_rate(&self) -> Option<u32> {
        self.baud_rate
    }

    fn schedule(&mut self, at_ms: u64, bytes: &[u8]) {
        // Keep arrival order: after everything due at or before `at_ms`.
        let mut index = self
            .inbound
            .iter()
            .position(|&(due, _)| due > at_ms)
            .unwrap_or(self.inbound.len());
        for &b in bytes {
            self.inbound.insert(index, (at_ms, b));
            index += 1;
        }
    }

    fn front_is_due(&self) -> bool {
        let now = self.clock.now();
        match self.inbound.front() {
            Some(&(due, _)) => now.wrapping_sub(due) <= u64::MAX / 2,
            None => false,
        }
    }
}

impl ByteChannel for MockChannel {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        if self.fail_writes {
            return Err(Error::Transport("simulated write failure".into()));
        }

        let now = self.clock.now();
        self.sent_log.push(SentFrame {
            at_ms: now,
            data: data.to_vec(),
        });

        if let Some(expectation) = self.expectations.pop_front() {
            if data != expectation.request.as_slice() {
                return Err(Error::Transport(format!(
                    "unexpected write: expected {:?}, got {:?}",
                    String::from_utf8_lossy(&expectation.request),
                    String::from_utf8_lossy(data)
                )));
            }
            let at = now.wrapping_add(expectation.delay_ms);
            self.schedule(at, &expectation.response);
        } else if let Some(responder) = self.responder.as_mut() {
            if let Some(response) = responder(data) {
                self.schedule(now, &response);
            }
        } else {
            tracing::trace!(data = ?String::from_utf8_lossy(data), "mock channel: unanswered write");
        }
        Ok(())
    }

    fn is_byte_available(&mut self) -> Result<bool> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        if self.front_is_due() {
            return Ok(true);
        }
        self.clock.advance(IDLE_TICK_MS);
        Ok(false)
    }

    fn read_byte(&mut self) -> Result<u8> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        if !self.front_is_due() {
            return Err(Error::Transport("read_byte with no byte available".into()));
        }
        match self.inbound.pop_front() {
            Some((_, b)) => Ok(b),
            None => Err(Error::Transport("read_byte with no byte available".into())),
        }
    }

    fn reconfigure_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        self.baud_rate = Some(baud_rate);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(channel: &mut MockChannel) -> Vec<u8> {
        let mut out = Vec::new();
        while channel.is_byte_available().unwrap() {
            out.push(channel.read_byte().unwrap());
        }
        out
    }

    #[test]
    fn mock_channel_basic_exchange() {
        let clock = MockClock::new();
        let mut channel = MockChannel::new(clock.clone());
        channel.expect(b"WRITE\r", b"OK\n\r");

        channel.write(b"WRITE\r").unwrap();
        assert_eq!(drain(&mut channel), b"OK\n\r");
        assert_eq!(channel.remaining_expectations(), 0);
    }

    #[test]
    fn mock_channel_tracks_sent_frames() {
        let clock = MockClock::starting_at(40);
        let mut channel = MockChannel::new(clock.clone());

        channel.write(b"\r").unwrap();
        clock.advance(10);
        channel.write(b"GET BAUD\r").unwrap();

        let frames = channel.sent_frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], SentFrame { at_ms: 40, data: b"\r".to_vec() });
        assert_eq!(frames[1].at_ms, 50);
        assert_eq!(channel.bytes_written(), 10);
    }

    #[test]
    fn mock_channel_wrong_write_errors() {
        let mut channel = MockChannel::new(MockClock::new());
        channel.expect(b"RESET\r", b"Ready\n\r");

        let result = channel.write(b"RESTORE\r");
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[test]
    fn mock_channel_idle_poll_advances_clock() {
        let clock = MockClock::new();
        let mut channel = MockChannel::new(clock.clone());

        for _ in 0..5 {
            assert!(!channel.is_byte_available().unwrap());
        }
        assert_eq!(clock.now(), 5);
    }

    #[test]
    fn mock_channel_delayed_response() {
        let clock = MockClock::new();
        let mut channel = MockChannel::new(clock.clone());
        channel.expect_delayed(b"WRITE\r", b"OK\n\r", 3);

        channel.write(b"WRITE\r").unwrap();
        assert!(!channel.is_byte_available().unwrap());
        assert!(!channel.is_byte_available().unwrap());
        assert!(!channel.is_byte_available().unwrap());
        assert!(channel.is_byte_available().unwrap());
        assert_eq!(clock.now(), 3);
        assert_eq!(drain(&mut channel), b"OK\n\r");
    }

    #[test]
    fn mock_channel_injected_bytes_keep_order() {
        let clock = MockClock::new();
        let mut channel = MockChannel::new(clock.clone());
        channel.inject_at(2, b"CD");
        channel.inject(b"AB");

        assert_eq!(drain(&mut channel), b"AB");
        clock.set(2);
        assert_eq!(drain(&mut channel), b"CD");
        assert_eq!(channel.pending_bytes(), 0);
    }

    #[test]
    fn mock_channel_read_without_data_errors() {
        let mut channel = MockChannel::new(MockClock::new());
        assert!(matches!(channel.read_byte(), Err(Error::Transport(_))));
    }

    #[test]
    fn mock_channel_silent_without_expectations() {
        let mut channel = MockChannel::new(MockClock::new());
        channel.write(b"STATUS\r").unwrap();
        assert!(!channel.is_byte_available().unwrap());
        assert_eq!(channel.sent_data(), vec![b"STATUS\r".to_vec()]);
    }

    #[test]
    fn mock_channel_responder_used_after_queue() {
        let mut channel = MockChannel::new(MockClock::new());
        channel.expect_silent(b"\r");
        channel.set_responder(|req| (req == b"WRITE\r").then(|| b"OK\n\r".to_vec()));

        channel.write(b"\r").unwrap();
        assert!(!channel.is_byte_available().unwrap());

        channel.write(b"WRITE\r").unwrap();
        assert_eq!(drain(&mut channel), b"OK\n\r");
    }

    #[test]
    fn mock_channel_simulated_write_failure() {
        let mut channel = MockChannel::new(MockClock::new());
        channel.set_fail_writes(true);
        assert!(matches!(channel.write(b"\r"), Err(Error::Transport(_))));
        assert!(channel.sent_frames().is_empty());
    }

    #[test]
    fn mock_channel_disconnect() {
        let mut channel = MockChannel::new(MockClock::new());
        channel.set_connected(false);
        assert!(matches!(channel.write(b"\r"), Err(Error::NotConnected)));
        assert!(matches!(
            channel.is_byte_available(),
            Err(Error::NotConnected)
        ));
        assert!(matches!(channel.read_byte(), Err(Error::NotConnected)));
    }

    #[test]
    fn mock_channel_records_baud_rate() {
        let mut channel = MockChannel::new(MockClock::new());
        assert_eq!(channel.baud_rate(), None);
        channel.reconfigure_baud_rate(57_600).unwrap();
        assert_eq!(channel.baud_rate(), Some(57_600));
    }

    #[test]
    fn mock_channel_due_check_survives_wrap() {
        let clock = MockClock::starting_at(u64::MAX - 1);
        let mut channel = MockChannel::new(clock.clone());
        channel.inject_at(u64::MAX, b"X");

        assert!(!channel.is_byte_available().unwrap());
        // The idle tick moved the clock onto the due time.
        assert!(channel.is_byte_available().unwrap());
        clock.advance(5);
        assert!(channel.is_byte_available().unwrap());
        assert_eq!(channel.read_byte().unwrap(), b'X');
    }
}
