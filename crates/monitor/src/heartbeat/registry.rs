use std::collections::HashMap;

use fleetwatch_core::heartbeat::{HeartbeatStatus, NodeBeat};
use fleetwatch_core::types::Timestamp;
use tokio::sync::RwLock;

use crate::clock::whole_secs_between;

/// What the monitor knows about one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatEntry {
    pub address: String,
    pub last_seen: Timestamp,
    /// The last report that carried task progress, as received.
    pub last_payload: Option<String>,
}

/// A node removed by a sweep for being silent past the dead threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadNode {
    pub node_id: String,
    pub address: String,
    pub last_seen: Timestamp,
    pub missing_secs: i64,
    pub last_payload: Option<String>,
}

/// The result of one classification pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeartbeatSweep {
    /// One classification per node tracked at the start of the pass,
    /// ordered by node id.
    pub beats: Vec<NodeBeat>,
    /// Nodes classified Dead; already removed from the registry.
    pub deaths: Vec<DeadNode>,
}

/// Last-seen state per node id.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared between the report processor and the heartbeat scheduler.
pub struct HeartbeatRegistry {
    entries: RwLock<HashMap<String, HeartbeatEntry>>,
}

impl HeartbeatRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Record that `node_id` was heard from at `now` via `address`.
    ///
    /// Creates the entry on first sighting (or after the node was declared
    /// dead). The last-known payload is kept.
    pub async fn refresh(&self, node_id: &str, address: &str, now: Timestamp) {
        let mut entries = self.entries.write().await;
        match entries.get_mut(node_id) {
            Some(entry) => {
                entry.address.clear();
                entry.address.push_str(address);
                entry.last_seen = now;
            }
            None => {
                entries.insert(
                    node_id.to_string(),
                    HeartbeatEntry {
                        address: address.to_string(),
                        last_seen: now,
                        last_payload: None,
                    },
                );
            }
        }
    }

    /// Remember the latest progress-carrying report of a tracked node.
    ///
    /// No-op for nodes that are not tracked.
    pub async fn store_payload(&self, node_id: &str, raw: String) {
        if let Some(entry) = self.entries.write().await.get_mut(node_id) {
            entry.last_payload = Some(raw);
        }
    }

    pub async fn get(&self, node_id: &str) -> Option<HeartbeatEntry> {
        self.entries.read().await.get(node_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Classify every tracked node at `now` and remove the dead ones.
    ///
    /// The whole pass runs under the write lock, so no report can refresh
    /// a node between its classification and its removal.
    pub async fn sweep(
        &self,
        now: Timestamp,
        interval_secs: i64,
        dead_after_secs: i64,
    ) -> HeartbeatSweep {
        let mut entries = self.entries.write().await;
        let mut sweep = HeartbeatSweep::default();

        let mut node_ids: Vec<String> = entries.keys().cloned().collect();
        node_ids.sort_unstable();

        for node_id in node_ids {
            let Some(entry) = entries.get(&node_id) else {
                continue;
            };
            let missing_secs = whole_secs_between(entry.last_seen, now);
            let status = HeartbeatStatus::classify(missing_secs, interval_secs, dead_after_secs);

            sweep.beats.push(NodeBeat {
                pc_id: node_id.clone(),
                ip: entry.address.clone(),
                hb: status,
            });

            if status == HeartbeatStatus::Dead {
                if let Some(entry) = entries.remove(&node_id) {
                    sweep.deaths.push(DeadNode {
                        node_id,
                        address: entry.address,
                        last_seen: entry.last_seen,
                        missing_secs,
                        last_payload: entry.last_payload,
                    });
                }
            }
        }

        sweep
    }
}

impl Default for HeartbeatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
