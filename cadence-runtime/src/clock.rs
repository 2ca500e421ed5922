//! Time sources for the scheduler.
//!
//! All timestamps are milliseconds since the clock's own origin, so a fresh
//! clock reads zero and a recurring task's "never fired" sentinel of 0 lines up
//! with the moment the clock started.

use std::cell::Cell;
use std::rc::Rc;
use tokio::time::Instant;

/// Provides the current timestamp to the scheduler.
pub trait Clock {
    /// Milliseconds elapsed since the clock's origin.
    fn now_ms(&self) -> u64;
}

/// Wall-independent clock backed by [`Instant`].
///
/// Reads tokio's instant, which stands still while a test runtime is paused
/// just like [`TokioPulse`](crate::TokioPulse) timers.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same reading, so a test can keep one handle and give
/// another to the scheduler.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(now_ms: u64) -> Self {
        let clock = Self::new();
        clock.set(now_ms);
        clock
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    /// Move the clock forward and return the new reading.
    pub fn advance(&self, ms: u64) -> u64 {
        let now = self.now.get().saturating_add(ms);
        self.now.set(now);
        now
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        assert_eq!(handle.now_ms(), 0);

        clock.advance(250);
        assert_eq!(handle.now_ms(), 250);

        handle.set(1000);
        assert_eq!(clock.now_ms(), 1000);
    }

    #[test]
    fn monotonic_clock_starts_near_zero() {
        let clock = MonotonicClock::new();
        let first = clock.now_ms();
        assert!(first < 1000);
        assert!(clock.now_ms() >= first);
    }
}
