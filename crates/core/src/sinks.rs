//! Contracts for the collaborators the monitor hands facts to.
//!
//! The monitor only ever calls these from detached tasks; an error returned
//! here is logged by the caller and never aborts registry updates.
//!
//! - [`PersistenceSink`] durably records reports, exceptions, deaths,
//!   traffic samples, and task progress.
//! - [`AlertSink`] delivers templated notifications to operators.
//! - [`BroadcastTransport`] pushes serialized events to live subscribers.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::{RecordId, Timestamp};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Failure reported by a collaborator.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Alert delivery failed: {0}")]
    Alert(String),
}

pub type SinkResult<T> = Result<T, SinkError>;

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// A processed report, ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRecord {
    pub node_id: String,
    pub address: String,
    /// `-1` when the report carried no usable step.
    pub step: i64,
    pub bank: String,
    /// Empty when the report carried no session id.
    pub session_id: String,
    /// Seconds since the previous distinct step of the same session; `0`
    /// when unknown.
    pub elapsed_secs: i64,
    /// Task-level exception text (`bank_status.exception`).
    pub exception: String,
    /// The report exactly as received.
    pub raw: String,
    pub received_at: Timestamp,
}

/// A node that went silent past the dead threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeDeath {
    pub node_id: String,
    pub address: String,
    /// When the node was last heard from.
    pub dead_at: Timestamp,
}

/// Reports processed during one traffic window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrafficSample {
    pub count: u64,
    pub window_start: Timestamp,
    pub window_end: Timestamp,
}

/// Latest observed progress of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskProgress {
    pub node_id: String,
    pub bank: String,
    pub session_id: String,
    pub step: i64,
}

/// Durable storage for monitoring facts.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Store a processed report and return its identity.
    async fn record_report(&self, report: &ReportRecord) -> SinkResult<RecordId>;

    /// Attach a task-level exception to a stored report.
    async fn record_exception(&self, record_id: RecordId, exception: &str) -> SinkResult<()>;

    /// Store a node death.
    async fn record_death(&self, death: &NodeDeath) -> SinkResult<()>;

    /// Store a traffic sample.
    async fn record_traffic(&self, sample: &TrafficSample) -> SinkResult<()>;

    /// Record the latest progress of a task.
    async fn record_progress(&self, progress: &TaskProgress) -> SinkResult<()>;
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// The notification templates operators receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTemplate {
    /// The node reported an exception at the node level.
    NodeException,
    /// A task on the node reported an exception in its `bank_status`.
    TaskException,
    /// The node went silent past the dead threshold.
    NodeDown,
}

impl AlertTemplate {
    /// Template name used to pick the message layout.
    pub fn name(self) -> &'static str {
        match self {
            Self::NodeException | Self::TaskException => "exception",
            Self::NodeDown => "node_down",
        }
    }

    /// Subject line for the notification.
    pub fn subject(self) -> &'static str {
        match self {
            Self::NodeException => "A node reported an exception",
            Self::TaskException => "A task reported an exception",
            Self::NodeDown => "A node is down",
        }
    }
}

/// A templated notification plus the values to render into it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub template: AlertTemplate,
    pub context: Map<String, Value>,
}

impl Alert {
    pub fn new(template: AlertTemplate) -> Self {
        Self {
            template,
            context: Map::new(),
        }
    }

    /// Add a context value.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

/// Outbound notification delivery.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify(&self, alert: &Alert) -> SinkResult<()>;
}

// ---------------------------------------------------------------------------
// Broadcast
// ---------------------------------------------------------------------------

/// Live subscriber fan-out.
///
/// `publish` is best-effort: subscribers that cannot take the message are
/// skipped.
#[async_trait]
pub trait BroadcastTransport: Send + Sync {
    async fn has_subscribers(&self) -> bool;

    async fn publish(&self, payload: Bytes);
}
