//! Wall-clock adapter.
//!
//! Blocking sleeps on the calling thread plus a monotonic uptime for the
//! startup banner and diagnostics.

use std::time::{Duration, Instant};

use crate::app::ports::Clock;

/// [`Clock`] backed by `std::thread::sleep`.
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds since the clock was created (monotonic).
    pub fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }

    /// Time since the clock was created (monotonic).
    pub fn uptime(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Clock for SystemClock {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
