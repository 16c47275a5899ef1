//! Inbound node status reports.
//!
//! A report is a JSON object pushed by a node on every heartbeat:
//!
//! ```json
//! {"pc_id": "A", "ip": "10.0.0.1", "bank_name": "X", "exception": "",
//!  "bank_status": {"step": 1, "sid": "s1", "anything": "else"}}
//! ```
//!
//! `bank_status` is optional. When present it carries the task progress
//! (`step`, `sid`, and an optional task-level `exception`) plus arbitrary
//! fields that are republished to subscribers untouched.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::{Map, Value};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// StatusReport
// ---------------------------------------------------------------------------

/// One decoded status report from a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Node identity. Reports with an empty id are discarded.
    #[serde(rename = "pc_id", default, deserialize_with = "nullable_string")]
    pub node_id: String,

    /// Last-known network address of the node.
    #[serde(rename = "ip", default, deserialize_with = "nullable_string")]
    pub address: String,

    /// Partition ("bank") the node is working on.
    #[serde(rename = "bank_name", default, deserialize_with = "nullable_string")]
    pub bank: String,

    /// Node-level exception text; empty when the node is healthy.
    #[serde(default, deserialize_with = "nullable_string")]
    pub exception: String,

    /// Task progress. `None` means a pure heartbeat.
    #[serde(rename = "bank_status", default)]
    pub progress: Option<ProgressPayload>,
}

impl StatusReport {
    /// Decode a raw report.
    pub fn parse(raw: &[u8]) -> Result<Self, CoreError> {
        Ok(serde_json::from_slice(raw)?)
    }

    /// Whether the node itself reported an exception.
    pub fn has_exception(&self) -> bool {
        !self.exception.is_empty()
    }
}

/// Treat JSON `null` like a missing string field.
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// ProgressPayload
// ---------------------------------------------------------------------------

/// Field name for the step index inside `bank_status`.
pub const FIELD_STEP: &str = "step";

/// Field name for the session id inside `bank_status`.
pub const FIELD_SESSION_ID: &str = "sid";

/// Field name for the task-level exception inside `bank_status`.
pub const FIELD_EXCEPTION: &str = "exception";

/// Field name for the step duration added to outbound status events.
pub const FIELD_STEP_DURATION: &str = "stc";

/// Task progress carried in `bank_status`.
///
/// The well-known fields are decoded into typed accessors while the object
/// text is kept exactly as received, so outbound events republish it byte
/// for byte. A `step` that is not a number, or a `sid` that is not a
/// string, is treated as absent.
#[derive(Debug, Clone)]
pub struct ProgressPayload {
    step: Option<i64>,
    session_id: Option<String>,
    exception: Option<String>,
    fields: Map<String, Value>,
    raw: Box<RawValue>,
}

impl ProgressPayload {
    /// Step index, if present and numeric.
    pub fn step(&self) -> Option<i64> {
        self.step
    }

    /// Session id, if present and a string.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Task-level exception text, if present and a string.
    pub fn exception(&self) -> Option<&str> {
        self.exception.as_deref()
    }

    /// The decoded object. Numbers outside the `i64`/`u64`/`f64` range are
    /// approximated here; use [`as_raw`](Self::as_raw) to republish.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The object text exactly as received.
    pub fn as_raw(&self) -> &str {
        self.raw.get()
    }

    /// The object text with the step duration (`stc`, whole seconds)
    /// appended as the last member. Every other byte is left as received.
    pub fn with_step_duration(&self, elapsed_secs: i64) -> String {
        let raw = self.raw.get().trim_end();
        match raw.strip_suffix('}') {
            Some(head) if !self.fields.contains_key(FIELD_STEP_DURATION) => {
                let separator = if head.trim_end().ends_with('{') { "" } else { "," };
                format!("{head}{separator}\"{FIELD_STEP_DURATION}\":{elapsed_secs}}}")
            }
            // A node that already sends `stc` gets it overwritten.
            _ => {
                let mut fields = self.fields.clone();
                fields.insert(FIELD_STEP_DURATION.to_string(), Value::from(elapsed_secs));
                Value::Object(fields).to_string()
            }
        }
    }

    fn from_raw(raw: Box<RawValue>) -> Result<Self, serde_json::Error> {
        let fields: Map<String, Value> = serde_json::from_str(raw.get())?;

        // Fractional steps are truncated toward zero.
        let step = fields
            .get(FIELD_STEP)
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)));
        let session_id = fields
            .get(FIELD_SESSION_ID)
            .and_then(Value::as_str)
            .map(str::to_string);
        let exception = fields
            .get(FIELD_EXCEPTION)
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            step,
            session_id,
            exception,
            fields,
            raw,
        })
    }
}

impl PartialEq for ProgressPayload {
    fn eq(&self, other: &Self) -> bool {
        self.raw.get() == other.raw.get()
    }
}

impl<'de> Deserialize<'de> for ProgressPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Self::from_raw(raw).map_err(de::Error::custom)
    }
}

impl Serialize for ProgressPayload {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.raw.serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
