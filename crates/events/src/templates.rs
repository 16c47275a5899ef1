//! Plain-text rendering of alert templates.

use fleetwatch_core::sinks::{Alert, AlertTemplate};
use serde_json::{Map, Value};

/// Prefix on every subject line.
const SUBJECT_PREFIX: &str = "[Fleetwatch]";

/// Placeholder for a context value the alert did not carry.
const MISSING: &str = "-";

/// A rendered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedAlert {
    pub subject: String,
    pub body: String,
}

/// Render `alert` with the layout its template names.
pub fn render(alert: &Alert) -> RenderedAlert {
    let ctx = &alert.context;
    let subject = format!(
        "{SUBJECT_PREFIX} {}: {}",
        alert.template.subject(),
        text(ctx, "pc_id")
    );

    let body = match alert.template {
        AlertTemplate::NodeException | AlertTemplate::TaskException => format!(
            "Node: {} ({})\n\
             Time: {}\n\
             Exception: {}\n\
             Task status:\n{}\n\
             Report:\n{}\n",
            text(ctx, "pc_id"),
            text(ctx, "ip"),
            text(ctx, "time"),
            text(ctx, "exception"),
            pretty(ctx, "bank_status"),
            text(ctx, "data"),
        ),
        AlertTemplate::NodeDown => format!(
            "Node: {} ({})\n\
             Last seen: {} ({} seconds ago)\n\
             Last data:\n{}\n",
            text(ctx, "pc_id"),
            text(ctx, "ip"),
            text(ctx, "down_time"),
            text(ctx, "missing_secs"),
            text(ctx, "last_data"),
        ),
    };

    RenderedAlert { subject, body }
}

/// A context value as display text. Strings are shown without quotes.
fn text(ctx: &Map<String, Value>, key: &str) -> String {
    match ctx.get(key) {
        None | Some(Value::Null) => MISSING.to_string(),
        Some(Value::String(s)) if s.is_empty() => MISSING.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn pretty(ctx: &Map<String, Value>, key: &str) -> String {
    match ctx.get(key) {
        None | Some(Value::Null) => MISSING.to_string(),
        Some(value) => serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
    }
}
