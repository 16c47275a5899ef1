//! Wall-clock source for the monitor.
//!
//! Every timestamp the monitor stores or compares comes from a [`Clock`],
//! so tests can drive time explicitly with [`ManualClock`].

use std::sync::Mutex;

use chrono::Utc;
use fleetwatch_core::types::Timestamp;

/// Source of "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The system UTC clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward by `secs` seconds.
    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += chrono::Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Whole seconds between two timestamps, counted on second boundaries.
///
/// `10:00:00.900` to `10:00:01.100` is one second, matching how nodes
/// report time.
pub fn whole_secs_between(earlier: Timestamp, later: Timestamp) -> i64 {
    later.timestamp() - earlier.timestamp()
}
