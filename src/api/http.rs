// SPDX-License-Identifier: GPL-3.0-only
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use crate::api::handlers::{ApiError, ApiHandlers, ApiResponse};
use crate::api::websocket::WebSocketServer;
use crate::streams::StreamItem;

pub struct HttpServer {
    handlers: Arc<ApiHandlers>,
    addr: SocketAddr,
}

impl HttpServer {
    pub fn new(snapshots: watch::Receiver<Vec<StreamItem>>, addr: SocketAddr) -> Self {
        Self {
            handlers: Arc::new(ApiHandlers::new(snapshots)),
            addr,
        }
    }

    /// REST routes plus the `/ws` snapshot push endpoint
    pub fn router(&self) -> Router {
        let websocket = WebSocketServer::new(Arc::clone(&self.handlers));

        Router::new()
            .route("/api/health", get(health_handler))
            .route("/api/streams", get(list_streams_handler))
            .route("/api/streams/:name", get(get_stream_handler))
            .with_state(Arc::clone(&self.handlers))
            .merge(websocket.router())
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        let app = self.router();

        info!(addr = %self.addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn health_handler() -> Json<ApiResponse<&'static str>> {
    ApiHandlers::health().await
}

async fn list_streams_handler(
    State(handlers): State<Arc<ApiHandlers>>,
) -> Json<ApiResponse<Vec<StreamItem>>> {
    handlers.list_streams().await
}

async fn get_stream_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<StreamItem>>, ApiError<StreamItem>> {
    handlers.get_stream(Path(name)).await
}
