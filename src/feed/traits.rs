// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use tokio::sync::mpsc::Receiver;
use tracing::{info, warn};
use crate::streams::StreamEvent;

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Open the stream event feed and return a receiver for its events
    async fn subscribe(&self) -> anyhow::Result<Receiver<StreamEvent>>;

    /// Release the server-side subscription.
    /// Must succeed when there is nothing to release.
    async fn unsubscribe(&self) -> anyhow::Result<()>;
}

/// Connection lifecycle notifications of a push feed
pub trait ConnectionCallback: Send + Sync {
    /// When a connection attempt is underway
    fn connecting(&self) {}

    /// When the connection was successfully established
    fn connected(&self) {}

    /// When the initial connection attempt failed
    fn connection_failed(&self, _error: &anyhow::Error) {}

    /// When a previously successful connection was disconnected
    fn disconnected(&self) {}
}

/// Reports connection lifecycle through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingCallback;

impl ConnectionCallback for LoggingCallback {
    fn connecting(&self) {
        info!("Connecting to stream event feed");
    }

    fn connected(&self) {
        info!("Connected to stream event feed");
    }

    fn connection_failed(&self, error: &anyhow::Error) {
        warn!(error = %error, "Connection to stream event feed failed");
    }

    fn disconnected(&self) {
        warn!("Stream event feed disconnected");
    }
}
