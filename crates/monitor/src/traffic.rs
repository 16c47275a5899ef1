//! Per-window count of processed reports.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use fleetwatch_core::sinks::TrafficSample;
use fleetwatch_core::types::Timestamp;

/// Counts reports carrying task progress within the current window.
///
/// Increments are lock-free. [`flush`](Self::flush) closes the window:
/// it takes the count, resets it to zero, and starts the next window.
#[derive(Debug)]
pub struct TrafficCounter {
    count: AtomicU64,
    window_start: Mutex<Timestamp>,
}

impl TrafficCounter {
    pub fn new(window_start: Timestamp) -> Self {
        Self {
            count: AtomicU64::new(0),
            window_start: Mutex::new(window_start),
        }
    }

    pub fn incr(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Count in the current window.
    pub fn current(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Close the current window at `now` and return what it counted.
    pub fn flush(&self, now: Timestamp) -> TrafficSample {
        let mut window_start = self.window_start.lock().unwrap_or_else(|e| e.into_inner());
        let count = self.count.swap(0, Ordering::AcqRel);
        let sample = TrafficSample {
            count,
            window_start: *window_start,
            window_end: now,
        };
        *window_start = now;
        sample
    }
}
