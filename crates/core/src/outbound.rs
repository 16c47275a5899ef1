//! Outbound events republished to live subscribers.
//!
//! Three shapes go out on the wire:
//!
//! - the heartbeat batch, a JSON array of [`NodeBeat`](crate::heartbeat::NodeBeat);
//! - [`SessionExpired`], when a task session goes stale;
//! - the node's own `bank_status` object, optionally carrying `stc`
//!   (see [`ProgressPayload`](crate::report::ProgressPayload)).

use serde::Serialize;

use crate::heartbeat::NodeBeat;

/// A task session was dropped after going silent past the staleness window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionExpired {
    pub pc_id: String,
    /// Partition ("bank") the expired session was working on.
    pub delete: String,
}

/// Encode one sweep's worth of heartbeat classifications.
pub fn encode_heartbeat_batch(beats: &[NodeBeat]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(beats)
}
