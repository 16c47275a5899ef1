//! WebSocket infrastructure.
//!
//! Subscriber connection management (the monitor's broadcast transport),
//! keep-alive pings, and the upgrade handlers for subscribers and for nodes
//! streaming reports.

mod handler;
mod keepalive;
pub mod manager;

pub use handler::{reports_ws_handler, ws_handler};
pub use keepalive::start_keepalive;
pub use manager::WsManager;
