// SPDX-License-Identifier: GPL-3.0-only
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::Json;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;
use crate::api::handlers::ApiHandlers;
use crate::streams::StreamItem;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum WsMessage {
    ListStreams,
    GetStream { name: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct WsResponse {
    success: bool,
    data: Option<serde_json::Value>,
    error: Option<String>,
}

/// Full snapshot pushed on connect and after every change
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename = "snapshot")]
struct SnapshotPush {
    streams: Vec<StreamItem>,
}

pub struct WebSocketServer {
    handlers: Arc<ApiHandlers>,
}

impl WebSocketServer {
    pub fn new(handlers: Arc<ApiHandlers>) -> Self {
        Self { handlers }
    }

    pub fn router(&self) -> Router {
        let handlers = self.handlers.clone();
        Router::new().route(
            "/ws",
            get(move |ws: WebSocketUpgrade| async move {
                ws.on_upgrade(move |socket| handle_socket(socket, handlers))
            }),
        )
    }
}

fn snapshot_message(streams: Vec<StreamItem>) -> Result<Message, serde_json::Error> {
    Ok(Message::Text(serde_json::to_string(&SnapshotPush { streams })?))
}

async fn handle_socket(socket: WebSocket, handlers: Arc<ApiHandlers>) {
    let client_id = Uuid::new_v4();
    info!(client_id = %client_id, "WebSocket client connected");

    let (sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut send_task = tokio::spawn(async move {
        let mut sender = sender;
        while let Some(msg) = rx.recv().await {
            if let Err(e) = sender.send(msg).await {
                error!(error = %e, "Failed to send WebSocket message");
                break;
            }
        }
    });

    let push_tx = tx.clone();
    let mut snapshots = handlers.watch_snapshots();
    let push_task = tokio::spawn(async move {
        let initial = snapshots.borrow_and_update().clone();
        let mut next = Some(initial);
        while let Some(streams) = next.take() {
            match snapshot_message(streams) {
                Ok(msg) => {
                    if push_tx.send(msg).is_err() {
                        return;
                    }
                }
                Err(e) => error!(error = %e, "Failed to encode snapshot"),
            }
            if snapshots.changed().await.is_ok() {
                next = Some(snapshots.borrow_and_update().clone());
            }
        }
        debug!("Snapshot source closed, no further pushes");
    });

    let handlers_clone = handlers.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if let Err(e) = handle_message(text, &handlers_clone, &tx).await {
                        error!(error = %e, "Failed to handle WebSocket message");
                    }
                }
                Message::Close(_) => {
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };
    push_task.abort();

    info!(client_id = %client_id, "WebSocket connection closed");
}

async fn handle_message(
    text: String,
    handlers: &ApiHandlers,
    tx: &mpsc::UnboundedSender<Message>,
) -> anyhow::Result<()> {
    let msg: WsMessage = match serde_json::from_str(&text) {
        Ok(m) => m,
        Err(e) => {
            let response = WsResponse {
                success: false,
                data: None,
                error: Some(format!("Invalid message format: {}", e)),
            };
            tx.send(Message::Text(serde_json::to_string(&response)?))?;
            return Ok(());
        }
    };

    let response = match msg {
        WsMessage::ListStreams => {
            let Json(api_response) = handlers.list_streams().await;
            WsResponse {
                success: api_response.success,
                data: api_response.data.map(serde_json::to_value).transpose()?,
                error: api_response.error,
            }
        }
        WsMessage::GetStream { name } => {
            let api_response = match handlers.get_stream(axum::extract::Path(name)).await {
                Ok(Json(found)) => found,
                Err((_, Json(not_found))) => not_found,
            };
            WsResponse {
                success: api_response.success,
                data: api_response.data.map(serde_json::to_value).transpose()?,
                error: api_response.error,
            }
        }
    };

    tx.send(Message::Text(serde_json::to_string(&response)?))?;
    Ok(())
}
