//! Alert sink that only writes to the log.

use async_trait::async_trait;
use fleetwatch_core::sinks::{Alert, AlertSink, SinkResult};

use crate::templates::render;

/// Logs every alert at `warn`. Used when SMTP is not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn notify(&self, alert: &Alert) -> SinkResult<()> {
        let rendered = render(alert);
        tracing::warn!(
            template = alert.template.name(),
            subject = %rendered.subject,
            body = %rendered.body,
            "Alert raised",
        );
        Ok(())
    }
}
