//! Delivery channels for operator alerts.

pub mod email;
pub mod log;

use std::sync::Arc;

use fleetwatch_core::sinks::AlertSink;

use self::email::{EmailAlertSink, EmailConfig};
use self::log::LogAlertSink;

/// Pick the alert sink for this deployment: SMTP when `SMTP_HOST` is set
/// and the transport can be built, otherwise log-only.
pub fn alert_sink_from_env() -> Arc<dyn AlertSink> {
    let Some(config) = EmailConfig::from_env() else {
        tracing::info!("SMTP_HOST not set, alerts will only be logged");
        return Arc::new(LogAlertSink);
    };

    let host = config.smtp_host.clone();
    match EmailAlertSink::new(config) {
        Ok(sink) => {
            tracing::info!(smtp_host = %host, "Email alerts enabled");
            Arc::new(sink)
        }
        Err(e) => {
            tracing::error!(error = %e, smtp_host = %host, "Failed to build SMTP transport, alerts will only be logged");
            Arc::new(LogAlertSink)
        }
    }
}
