//! Shared, manually advanced millisecond clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bc127_core::clock::Clock;

/// A [`Clock`] that only moves when told to.
///
/// Clones share the same counter, so a test can hand one clone to the
/// engine, another to a [`MockChannel`](crate::MockChannel), and keep a third
/// to read the simulated time after an exchange.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    now: Arc<AtomicU64>,
}

impl MockClock {
    /// Create a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock reading `ms`.
    pub fn starting_at(ms: u64) -> Self {
        MockClock {
            now: Arc::new(AtomicU64::new(ms)),
        }
    }

    /// Current simulated time.
    pub fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    /// Move time forward by `ms`, wrapping at `u64::MAX`.
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now_millis(&self) -> u64 {
        self.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_time() {
        let a = MockClock::new();
        let b = a.clone();
        a.advance(250);
        assert_eq!(b.now_millis(), 250);
        b.set(1_000);
        assert_eq!(a.now(), 1_000);
    }

    #[test]
    fn advance_wraps() {
        let clock = MockClock::starting_at(u64::MAX - 1);
        clock.advance(3);
        assert_eq!(clock.now(), 1);
    }
}
