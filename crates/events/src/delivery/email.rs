//! Alert delivery via SMTP.
//!
//! [`EmailAlertSink`] wraps the `lettre` async SMTP transport to send
//! plain-text alerts to a fixed recipient list. Configuration is loaded from
//! environment variables; if `SMTP_HOST` is not set, [`EmailConfig::from_env`]
//! returns `None` and no mailer should be constructed.

use async_trait::async_trait;
use fleetwatch_core::sinks::{Alert, AlertSink, SinkError, SinkResult};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::templates::render;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

impl From<EmailError> for SinkError {
    fn from(e: EmailError) -> Self {
        SinkError::Alert(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@fleetwatch.local";

/// Configuration for the SMTP alert sink.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    /// Every alert goes to all of these.
    pub recipients: Vec<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured and should be skipped.
    ///
    /// | Variable           | Required | Default                    |
    /// |--------------------|----------|----------------------------|
    /// | `SMTP_HOST`        | yes      | none                       |
    /// | `SMTP_PORT`        | no       | `587`                      |
    /// | `SMTP_FROM`        | no       | `noreply@fleetwatch.local` |
    /// | `SMTP_USER`        | no       | none                       |
    /// | `SMTP_PASSWORD`    | no       | none                       |
    /// | `ALERT_RECIPIENTS` | no       | empty (comma-separated)    |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            recipients: parse_recipients(&std::env::var("ALERT_RECIPIENTS").unwrap_or_default()),
        })
    }
}

/// Split a comma-separated address list, dropping blanks.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// EmailAlertSink
// ---------------------------------------------------------------------------

/// Sends rendered alerts via SMTP.
pub struct EmailAlertSink {
    config: EmailConfig,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailAlertSink {
    /// Build the SMTP transport. No connection is made until the first send.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            mailer: transport_builder.build(),
            config,
        })
    }

    fn build_message(&self, alert: &Alert) -> Result<Message, EmailError> {
        let rendered = render(alert);

        let mut builder = Message::builder()
            .from(self.config.from_address.parse()?)
            .subject(rendered.subject)
            .header(ContentType::TEXT_PLAIN);
        for recipient in &self.config.recipients {
            builder = builder.to(recipient.parse()?);
        }

        builder
            .body(rendered.body)
            .map_err(|e| EmailError::Build(e.to_string()))
    }
}

#[async_trait]
impl AlertSink for EmailAlertSink {
    async fn notify(&self, alert: &Alert) -> SinkResult<()> {
        if self.config.recipients.is_empty() {
            tracing::warn!(
                template = alert.template.name(),
                "No alert recipients configured, dropping alert",
            );
            return Ok(());
        }

        let email = self.build_message(alert)?;
        self.mailer.send(email).await.map_err(EmailError::from)?;

        tracing::info!(
            recipients = self.config.recipients.len(),
            template = alert.template.name(),
            "Alert email sent",
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
