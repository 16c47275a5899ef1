//! Row structs for the monitoring tables.
//!
//! Inserts take the record types from `fleetwatch_core::sinks` directly;
//! these structs are what the repositories read back.

pub mod node;
pub mod report;
pub mod traffic;
