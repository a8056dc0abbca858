use super::AppState;
use crate::recorder::LogEntry;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Messages pushed to dashboard clients
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Log { entry: LogEntry },
}

/// GET /api/ws - WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("WebSocket upgrade request received");
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Create WebSocket router
pub fn create_ws_router(state: AppState) -> Router {
    Router::new()
        .route("/api/ws", get(ws_handler))
        .with_state(Arc::new(state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let log_rx = state.orchestrator.subscribe_logs().await;
    stream_logs(socket, log_rx).await;
}

/// Forward each new log entry until the client leaves
async fn stream_logs(mut socket: WebSocket, mut log_rx: broadcast::Receiver<LogEntry>) {
    info!("WebSocket connection established");

    loop {
        tokio::select! {
            Some(msg) = socket.recv() => {
                match msg {
                    Ok(Message::Close(_)) => {
                        info!("WebSocket client disconnected");
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        if let Err(e) = socket.send(Message::Pong(data)).await {
                            error!(error = %e, "Failed to send pong");
                            break;
                        }
                    }
                    Ok(_) => {
                        // Clients only listen
                    }
                    Err(e) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            result = log_rx.recv() => {
                match result {
                    Ok(entry) => {
                        if let Err(e) = send_entry(&mut socket, entry).await {
                            error!(error = %e, "Failed to send log entry");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped = skipped, "WebSocket lagged, skipped log entries");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        error!("Log broadcast channel closed");
                        break;
                    }
                }
            }

            else => {
                break;
            }
        }
    }

    info!("WebSocket connection closed");
}

async fn send_entry(socket: &mut WebSocket, entry: LogEntry) -> anyhow::Result<()> {
    let json = serde_json::to_string(&ServerMessage::Log { entry })?;
    socket.send(Message::Text(json)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::LogKind;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_log_message_format() {
        let entry = LogEntry {
            id: Uuid::now_v7().to_string(),
            timestamp: Utc::now(),
            kind: LogKind::Action,
            message: "Traffic signals adjusted.".to_string(),
            data: None,
        };

        let json = serde_json::to_value(ServerMessage::Log { entry }).unwrap();
        assert_eq!(json["type"], "log");
        assert_eq!(json["entry"]["type"], "ACTION");
        assert_eq!(json["entry"]["message"], "Traffic signals adjusted.");
    }
}
