//! Monotonic time source for the dispatch loop.
//!
//! The controllers never read a clock themselves; the driver loop passes
//! `now_ms` into every call.  This adapter provides that value on a host
//! build from `std::time::Instant`.

use std::time::Instant;

/// Milliseconds since construction.
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Milliseconds since start (monotonic).
    pub fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
