//! Operator notifications for the fleet monitor.
//!
//! - [`templates`] renders an [`Alert`](fleetwatch_core::sinks::Alert) into
//!   a subject line and a plain-text body.
//! - [`delivery`] holds the [`AlertSink`](fleetwatch_core::sinks::AlertSink)
//!   implementations: SMTP email, and a log-only fallback for deployments
//!   without a mail server.

pub mod delivery;
pub mod templates;

pub use delivery::email::{EmailAlertSink, EmailConfig, EmailError};
pub use delivery::log::LogAlertSink;
pub use delivery::alert_sink_from_env;
pub use templates::{render, RenderedAlert};
