//! Node liveness tracking.
//!
//! [`HeartbeatRegistry`] holds the last-seen state of every node and is
//! refreshed by the report processor. [`HeartbeatScheduler`] sweeps it on a
//! fixed interval, publishing one classification batch per sweep and
//! raising a one-time alert for each node that has gone dead.

mod registry;
mod scheduler;

pub use registry::{DeadNode, HeartbeatEntry, HeartbeatRegistry, HeartbeatSweep};
pub use scheduler::HeartbeatScheduler;
