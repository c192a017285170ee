// SPDX-License-Identifier: GPL-3.0-only
use axum::extract::Path;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::streams::StreamItem;

/// Status and body returned when a lookup fails
pub type ApiError<T> = (StatusCode, Json<ApiResponse<T>>);

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Read-only views over the published stream snapshot
pub struct ApiHandlers {
    snapshots: watch::Receiver<Vec<StreamItem>>,
}

impl ApiHandlers {
    pub fn new(snapshots: watch::Receiver<Vec<StreamItem>>) -> Self {
        Self { snapshots }
    }

    /// A fresh receiver, for connections that follow every change
    pub fn watch_snapshots(&self) -> watch::Receiver<Vec<StreamItem>> {
        self.snapshots.clone()
    }

    pub fn current_snapshot(&self) -> Vec<StreamItem> {
        self.snapshots.borrow().clone()
    }
}

impl ApiHandlers {
    pub async fn health() -> Json<ApiResponse<&'static str>> {
        Json(ApiResponse::success("ok"))
    }

    pub async fn list_streams(&self) -> Json<ApiResponse<Vec<StreamItem>>> {
        Json(ApiResponse::success(self.current_snapshot()))
    }

    pub async fn get_stream(
        &self,
        Path(name): Path<String>,
    ) -> Result<Json<ApiResponse<StreamItem>>, ApiError<StreamItem>> {
        let found = self
            .snapshots
            .borrow()
            .iter()
            .find(|item| item.name == name)
            .cloned();

        match found {
            Some(item) => Ok(Json(ApiResponse::success(item))),
            None => {
                debug!(name = %name, "Stream not found");
                Err((
                    StatusCode::NOT_FOUND,
                    Json(ApiResponse::error(format!("Stream not found: {}", name))),
                ))
            }
        }
    }
}
