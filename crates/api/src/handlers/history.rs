//! Read-only views over what the monitor has persisted.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use fleetwatch_core::types::RecordId;
use fleetwatch_db::models::node::{NodeDeathRow, TaskProgressRow};
use fleetwatch_db::models::report::{ReportExceptionRow, StatusReportRow};
use fleetwatch_db::models::traffic::TrafficSampleRow;
use fleetwatch_db::repositories::{
    NodeDeathRepo, ReportExceptionRepo, StatusReportRepo, TaskProgressRepo, TrafficSampleRepo,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_REPORT_LIMIT: i64 = 50;
const MAX_REPORT_LIMIT: i64 = 500;

/// One week.
const MAX_TRAFFIC_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TrafficQuery {
    /// How far back to look (default 60).
    pub minutes: Option<i64>,
}

/// A stored report with the task exceptions recorded against it.
#[derive(Debug, Serialize)]
pub struct ReportDetail {
    #[serde(flatten)]
    pub report: StatusReportRow,
    pub exceptions: Vec<ReportExceptionRow>,
}

/// GET /api/v1/nodes/{pc_id}/reports?limit=
///
/// Most recent reports first.
pub async fn list_node_reports(
    State(state): State<AppState>,
    Path(pc_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<DataResponse<Vec<StatusReportRow>>>> {
    let limit = query.limit.unwrap_or(DEFAULT_REPORT_LIMIT);
    if !(1..=MAX_REPORT_LIMIT).contains(&limit) {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {MAX_REPORT_LIMIT}"
        )));
    }

    let reports = StatusReportRepo::list_for_node(&state.pool, &pc_id, limit).await?;
    Ok(Json(DataResponse { data: reports }))
}

/// GET /api/v1/reports/{id}
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> AppResult<Json<DataResponse<ReportDetail>>> {
    let report = StatusReportRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            entity: "Report",
            id: id.to_string(),
        })?;
    let exceptions = ReportExceptionRepo::list_for_report(&state.pool, id).await?;

    Ok(Json(DataResponse {
        data: ReportDetail { report, exceptions },
    }))
}

/// GET /api/v1/sessions/{sid}/reports
///
/// Every stored step of one task session, in order.
pub async fn list_session_reports(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> AppResult<Json<DataResponse<Vec<StatusReportRow>>>> {
    let reports = StatusReportRepo::list_for_session(&state.pool, &sid).await?;
    Ok(Json(DataResponse { data: reports }))
}

/// GET /api/v1/nodes/{pc_id}/banks/{bank}/sessions/{sid}/progress
pub async fn get_task_progress(
    State(state): State<AppState>,
    Path((pc_id, bank, sid)): Path<(String, String, String)>,
) -> AppResult<Json<DataResponse<TaskProgressRow>>> {
    let progress = TaskProgressRepo::find(&state.pool, &pc_id, &bank, &sid)
        .await?
        .ok_or_else(|| AppError::NotFound {
            entity: "Task progress",
            id: format!("{pc_id}/{bank}/{sid}"),
        })?;
    Ok(Json(DataResponse { data: progress }))
}

/// GET /api/v1/nodes/{pc_id}/deaths
pub async fn list_node_deaths(
    State(state): State<AppState>,
    Path(pc_id): Path<String>,
) -> AppResult<Json<DataResponse<Vec<NodeDeathRow>>>> {
    let deaths = NodeDeathRepo::list_for_node(&state.pool, &pc_id).await?;
    Ok(Json(DataResponse { data: deaths }))
}

/// GET /api/v1/traffic?minutes=
pub async fn list_traffic(
    State(state): State<AppState>,
    Query(query): Query<TrafficQuery>,
) -> AppResult<Json<DataResponse<Vec<TrafficSampleRow>>>> {
    let minutes = query.minutes.unwrap_or(60);
    if !(1..=MAX_TRAFFIC_MINUTES).contains(&minutes) {
        return Err(AppError::BadRequest(format!(
            "minutes must be between 1 and {MAX_TRAFFIC_MINUTES}"
        )));
    }

    let since = Utc::now() - Duration::minutes(minutes);
    let samples = TrafficSampleRepo::list_since(&state.pool, since).await?;
    Ok(Json(DataResponse { data: samples }))
}
