// SPDX-License-Identifier: GPL-3.0-only
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use stream_monitor::api::HttpServer;
use stream_monitor::config::Config;
use stream_monitor::feed::{ArchiveCatalog, EventSource, LoggingCallback, WebSocketEventSource};
use stream_monitor::logging::setup_logging;
use stream_monitor::streams::LiveListSynchronizer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    setup_logging(&config.log_level, config.log_format)?;

    info!("Starting stream-monitor v{}", env!("CARGO_PKG_VERSION"));

    let mut synchronizer = LiveListSynchronizer::new();

    if config.seed_from_archive {
        let catalog = ArchiveCatalog::new(
            config.api_base_url.clone(),
            config.instance.clone(),
            config.api_key.clone(),
        )?;
        match catalog.list_streams().await {
            Ok(streams) => {
                info!(count = streams.len(), "Seeded snapshot from archive");
                synchronizer.seed(streams);
            }
            Err(e) => {
                warn!(error = %e, "Failed to seed snapshot, starting empty");
            }
        }
    }

    let source: Arc<dyn EventSource> = Arc::new(
        WebSocketEventSource::new(&config.server_url, config.instance.clone(), Arc::new(LoggingCallback))?
            .with_api_key(config.api_key.clone())
            .with_buffer(config.event_buffer),
    );

    let mut sync_handle = synchronizer.start(source);

    // Start HTTP server
    let http_server = HttpServer::new(sync_handle.snapshots(), config.local_api_bind);
    let http_task = tokio::spawn(async move {
        if let Err(e) = http_server.serve().await {
            error!(error = %e, "HTTP server error");
        }
    });

    info!(instance = %config.instance, "All services started. Waiting for shutdown signal...");

    // Wait for shutdown signal
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal (Ctrl+C)");
        }
        Err(err) => {
            error!(error = %err, "Unable to listen for shutdown signal");
        }
    }

    // Graceful shutdown
    info!("Initiating graceful shutdown...");

    sync_handle.stop().await;
    http_task.abort();

    info!("Shutdown complete");
    Ok(())
}
