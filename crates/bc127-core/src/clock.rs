//! Monotonic millisecond clock.
//!
//! The command engine only ever compares two readings of the same clock, so
//! the absolute value carries no meaning. Comparisons are done with
//! `wrapping_sub` so a counter that wraps does not break deadlines.

use std::time::Instant;

/// A monotonic time source with millisecond resolution.
pub trait Clock {
    /// Milliseconds elapsed since an arbitrary, fixed origin.
    fn now_millis(&self) -> u64;
}

impl<T: Clock + ?Sized> Clock for Box<T> {
    fn now_millis(&self) -> u64 {
        (**self).now_millis()
    }
}

/// [`Clock`] backed by [`std::time::Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is the moment of construction.
    pub fn new() -> Self {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_millis();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = clock.now_millis();
        assert!(b >= a + 5);
    }

    #[test]
    fn boxed_clock_forwards() {
        let clock: Box<dyn Clock> = Box::new(SystemClock::new());
        assert!(clock.now_millis() < 1_000);
    }
}
