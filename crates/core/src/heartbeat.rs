//! Node liveness classification and the heartbeat batch event.
//!
//! Pure functions shared by the monitor and anything that needs to
//! interpret the `hb` codes on the wire.

use serde::Serialize;

/// Liveness of a node at the time of a heartbeat sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "i8")]
pub enum HeartbeatStatus {
    /// Reported within the heartbeat interval.
    Active,
    /// Missed the heartbeat interval but not yet past the dead threshold.
    Late,
    /// Silent past the dead threshold. Emitted once, then forgotten.
    Dead,
}

impl HeartbeatStatus {
    /// Classify a node from the seconds elapsed since its last report.
    ///
    /// - `miss < interval_secs` is [`Active`](Self::Active).
    /// - `interval_secs <= miss < dead_after_secs` is [`Late`](Self::Late).
    /// - anything else is [`Dead`](Self::Dead).
    pub fn classify(miss_secs: i64, interval_secs: i64, dead_after_secs: i64) -> Self {
        if miss_secs < interval_secs {
            Self::Active
        } else if miss_secs < dead_after_secs {
            Self::Late
        } else {
            Self::Dead
        }
    }

    /// Wire code: `1` active, `0` late, `-1` dead.
    pub fn code(self) -> i8 {
        match self {
            Self::Active => 1,
            Self::Late => 0,
            Self::Dead => -1,
        }
    }
}

impl From<HeartbeatStatus> for i8 {
    fn from(status: HeartbeatStatus) -> Self {
        status.code()
    }
}

/// One element of the outbound heartbeat batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeBeat {
    pub pc_id: String,
    pub ip: String,
    pub hb: HeartbeatStatus,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
