//! Report ingestion over HTTP.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bytes::Bytes;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Accepted {
    /// Free slots left in the ingestion queue after this report.
    pub queue_remaining: usize,
}

/// POST /api/v1/reports -- enqueue one raw report.
///
/// The body is not parsed here; malformed reports are discarded by the
/// processor. Returns 503 instead of waiting when the queue is full.
pub async fn submit_report(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    if body.is_empty() {
        return Err(AppError::BadRequest("Report body is empty".to_string()));
    }

    state.reports.try_enqueue(body).inspect_err(|e| {
        tracing::warn!(error = %e, "Report rejected");
    })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(Accepted {
            queue_remaining: state.reports.remaining_capacity(),
        }),
    ))
}
