pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /reports                                         submit one report (POST)
/// /reports/{id}                                    stored report + exceptions
/// /sessions/{sid}/reports                          stored steps of a session
/// /nodes/{pc_id}/reports                           recent reports (?limit=)
/// /nodes/{pc_id}/deaths                            recorded deaths
/// /nodes/{pc_id}/banks/{bank}/sessions/{sid}/progress
///                                                  latest task progress
/// /traffic                                         traffic samples (?minutes=)
/// ```
pub fn api_routes() -> Router<AppState> {
    use handlers::history;

    Router::new()
        .route("/reports", post(handlers::reports::submit_report))
        .route("/reports/{id}", get(history::get_report))
        .route("/sessions/{sid}/reports", get(history::list_session_reports))
        .route("/nodes/{pc_id}/reports", get(history::list_node_reports))
        .route("/nodes/{pc_id}/deaths", get(history::list_node_deaths))
        .route(
            "/nodes/{pc_id}/banks/{bank}/sessions/{sid}/progress",
            get(history::get_task_progress),
        )
        .route("/traffic", get(history::list_traffic))
}

/// WebSocket routes, mounted at the root.
///
/// ```text
/// /ws                                              subscriber events
/// /ws/reports                                      node report stream
/// ```
pub fn ws_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/ws/reports", get(ws::reports_ws_handler))
}
