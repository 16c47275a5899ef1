//! Per-session step timing.
//!
//! Tracks, for every open task session, the last step it reported and when.
//! The time between two distinct steps of the same session is the step
//! duration republished as `stc`.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use fleetwatch_core::types::Timestamp;

use crate::clock::whole_secs_between;

/// An open task session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSession {
    pub node_id: String,
    pub bank: String,
    pub step: i64,
    pub updated_at: Timestamp,
}

/// A session dropped by the staleness sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredSession {
    pub session_id: String,
    pub session: StepSession,
}

/// How a report moved its session along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepTransition {
    /// Same step as last time. Nothing changed.
    Duplicate,
    /// First report for this session.
    Started,
    /// The session moved to a new, non-terminal step.
    Advanced { elapsed_secs: i64 },
    /// The session reached the terminal step and was closed. `elapsed_secs`
    /// is zero when the terminal step was also the first one seen.
    Finished { elapsed_secs: i64 },
}

impl StepTransition {
    /// Seconds since the previous distinct step, or zero when there is none.
    pub fn elapsed_secs(self) -> i64 {
        match self {
            Self::Advanced { elapsed_secs } | Self::Finished { elapsed_secs } => elapsed_secs,
            Self::Duplicate | Self::Started => 0,
        }
    }
}

/// Open sessions keyed by session id.
///
/// Backed by a sharded concurrent map. [`advance`](Self::advance) holds the
/// lock of the key's shard for its whole read-compare-write, so two reports
/// for the same session are applied one after the other while reports for
/// other sessions proceed in parallel.
pub struct StepTimingRegistry {
    sessions: DashMap<String, StepSession>,
    terminal_step: i64,
}

impl StepTimingRegistry {
    pub fn new(terminal_step: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            terminal_step,
        }
    }

    /// Apply a report of `step` for `session_id` observed at `now`.
    pub fn advance(
        &self,
        session_id: &str,
        step: i64,
        node_id: &str,
        bank: &str,
        now: Timestamp,
    ) -> StepTransition {
        let finished = step == self.terminal_step;
        let session = StepSession {
            node_id: node_id.to_string(),
            bank: bank.to_string(),
            step,
            updated_at: now,
        };

        match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                let previous = occupied.get();
                if previous.step == step {
                    return StepTransition::Duplicate;
                }

                let elapsed_secs = whole_secs_between(previous.updated_at, now);
                if finished {
                    occupied.remove();
                    StepTransition::Finished { elapsed_secs }
                } else {
                    occupied.insert(session);
                    StepTransition::Advanced { elapsed_secs }
                }
            }
            Entry::Vacant(vacant) => {
                if finished {
                    StepTransition::Finished { elapsed_secs: 0 }
                } else {
                    vacant.insert(session);
                    StepTransition::Started
                }
            }
        }
    }

    /// Remove and return every session untouched for more than
    /// `staleness_secs` at `now`.
    pub fn expire_stale(&self, now: Timestamp, staleness_secs: i64) -> Vec<ExpiredSession> {
        let mut expired = Vec::new();
        self.sessions.retain(|session_id, session| {
            if whole_secs_between(session.updated_at, now) > staleness_secs {
                expired.push(ExpiredSession {
                    session_id: session_id.clone(),
                    session: session.clone(),
                });
                false
            } else {
                true
            }
        });
        expired.sort_unstable_by(|a, b| a.session_id.cmp(&b.session_id));
        expired
    }

    pub fn get(&self, session_id: &str) -> Option<StepSession> {
        self.sessions.get(session_id).map(|s| s.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
