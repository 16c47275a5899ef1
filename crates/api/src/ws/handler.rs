use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use bytes::Bytes;
use fleetwatch_monitor::ingest::ReportSender;
use futures::{SinkExt, StreamExt};

use crate::state::AppState;
use crate::ws::manager::WsManager;

/// GET /ws -- upgrade to a subscriber connection.
///
/// After the upgrade the connection is registered with `WsManager` and
/// receives every event the monitor broadcasts.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_subscriber(socket, state.ws_manager))
}

/// Manage a single subscriber connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `WsManager`.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Drains inbound frames on the current task until the client leaves.
///   4. Cleans up on disconnect.
async fn handle_subscriber(socket: WebSocket, ws_manager: Arc<WsManager>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "Subscriber connected");

    let mut rx = ws_manager.add(conn_id.clone()).await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            // Subscribers only listen.
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "Subscriber disconnected");
}

/// GET /ws/reports -- upgrade to a report stream from a node.
///
/// Every text or binary frame is one raw report, enqueued as-is.
pub async fn reports_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_report_stream(socket, state.reports))
}

/// Feed a node's report stream into the ingestion queue.
///
/// Unlike the HTTP endpoint this waits for queue capacity, so a full queue
/// slows the node down instead of rejecting its reports.
async fn handle_report_stream(socket: WebSocket, reports: ReportSender) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "Report stream connected");

    let (_sink, mut stream) = socket.split();
    let mut received = 0u64;

    while let Some(result) = stream.next().await {
        let raw = match result {
            Ok(Message::Text(text)) => Bytes::from(text.as_str().to_owned()),
            Ok(Message::Binary(data)) => data,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue, // ping, pong
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "Report stream receive error");
                break;
            }
        };

        if raw.is_empty() {
            continue;
        }

        if let Err(e) = reports.enqueue(raw).await {
            tracing::warn!(conn_id = %conn_id, error = %e, "Report stream closed by server");
            break;
        }
        received += 1;
    }

    tracing::info!(conn_id = %conn_id, received, "Report stream disconnected");
}
