//! Fleetwatch domain types.
//!
//! Shared by every other crate in the workspace and free of internal
//! dependencies:
//!
//! - [`report`]: inbound status reports and task progress payloads.
//! - [`heartbeat`]: liveness classification and its wire codes.
//! - [`outbound`]: events republished to live subscribers.
//! - [`sinks`]: contracts for persistence, alerting, and broadcast.

pub mod error;
pub mod heartbeat;
pub mod outbound;
pub mod report;
pub mod sinks;
pub mod types;
