//! Fleetwatch monitoring engine.
//!
//! Ingests node status reports, tracks node liveness and per-task step
//! timing, counts throughput, and republishes derived events:
//!
//! - [`ingest`]: bounded inbound queue and its consumer loop.
//! - [`processor`]: per-report registry updates and the status event.
//! - [`heartbeat`]: liveness registry and its sweep.
//! - [`step`]: per-session step timing.
//! - [`sweep`]: stale-session expiry and the traffic window flush.
//! - [`traffic`]: processed-report counter.
//! - [`broadcast`]: best-effort subscriber fan-out.
//! - [`dispatch`]: fire-and-forget persistence and alert calls.
//! - [`monitor`]: wires everything together and owns the tasks.

pub mod broadcast;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod heartbeat;
pub mod ingest;
pub mod monitor;
pub mod processor;
pub mod step;
pub mod sweep;
pub mod traffic;

pub use config::MonitorConfig;
pub use monitor::{Collaborators, Monitor};
