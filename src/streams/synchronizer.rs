// SPDX-License-Identifier: GPL-3.0-only
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::feed::EventSource;
use crate::streams::models::{StreamEvent, StreamEventKind, StreamItem};

/// Folds a push feed of stream events into a sorted snapshot.
///
/// Items are keyed by name. Every applied event republishes the full
/// snapshot, sorted by name, to all `watch` receivers. Names compare
/// case-insensitively first, then byte-wise to keep the order total.
pub struct LiveListSynchronizer {
    items_by_name: BTreeMap<String, StreamItem>,
    snapshot_tx: watch::Sender<Vec<StreamItem>>,
}

impl LiveListSynchronizer {
    pub fn new() -> Self {
        let (snapshot_tx, _) = watch::channel(Vec::new());
        Self {
            items_by_name: BTreeMap::new(),
            snapshot_tx,
        }
    }

    /// Receiver observing every republished snapshot
    pub fn subscribe(&self) -> watch::Receiver<Vec<StreamItem>> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> Vec<StreamItem> {
        self.snapshot_tx.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.items_by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items_by_name.is_empty()
    }

    /// Insert or overwrite items as if each had been CREATED, then publish once
    pub fn seed(&mut self, items: impl IntoIterator<Item = StreamItem>) {
        for item in items {
            self.upsert(item.name, item.data_count);
        }
        self.publish();
    }

    pub fn on_event(&mut self, event: StreamEvent) {
        match event.kind {
            StreamEventKind::Created | StreamEventKind::Updated => {
                self.upsert(event.name, event.data_count);
            }
            StreamEventKind::Deleted => {
                if self.items_by_name.remove(&event.name).is_none() {
                    debug!(name = %event.name, "Delete for unknown stream");
                }
            }
            StreamEventKind::Other(tag) => {
                warn!(tag = %tag, name = %event.name, "Unexpected stream update type");
                return;
            }
        }
        self.publish();
    }

    fn upsert(&mut self, name: String, data_count: u64) {
        match self.items_by_name.get_mut(&name) {
            Some(item) => item.data_count = data_count,
            None => {
                self.items_by_name
                    .insert(name.clone(), StreamItem { name, data_count });
            }
        }
    }

    fn publish(&self) {
        let mut snapshot: Vec<StreamItem> = self.items_by_name.values().cloned().collect();
        snapshot.sort_by(|a, b| compare_names(&a.name, &b.name));
        self.snapshot_tx.send_replace(snapshot);
    }

    /// Subscribe to `source` on a new task and fold its events until stopped.
    ///
    /// The returned handle owns the subscription. The server-side release runs
    /// once, when the handle is stopped or dropped, or when the feed ends.
    pub fn start(self, source: Arc<dyn EventSource>) -> SyncHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let snapshots = self.subscribe();
        let task = tokio::spawn(self.run(source, stop_rx));

        SyncHandle {
            snapshots,
            stop_tx: Some(stop_tx),
            task: Some(task),
        }
    }

    async fn run(mut self, source: Arc<dyn EventSource>, mut stop_rx: oneshot::Receiver<()>) {
        let subscribed = tokio::select! {
            result = source.subscribe() => Some(result),
            _ = &mut stop_rx => None,
        };

        match subscribed {
            Some(Ok(mut events)) => {
                info!("Stream event subscription started");
                loop {
                    tokio::select! {
                        maybe_event = events.recv() => match maybe_event {
                            Some(event) => self.on_event(event),
                            None => {
                                info!("Stream event feed ended");
                                break;
                            }
                        },
                        _ = &mut stop_rx => break,
                    }
                }
            }
            Some(Err(e)) => {
                error!(error = %e, "Failed to subscribe to stream events");
            }
            None => {
                debug!("Stopped before the subscription completed");
            }
        }

        if let Err(e) = source.unsubscribe().await {
            warn!(error = %e, "Failed to release stream event subscription");
        }
        info!(streams = self.len(), "Stream synchronizer stopped");
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

impl Default for LiveListSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned handle of a started synchronizer
pub struct SyncHandle {
    snapshots: watch::Receiver<Vec<StreamItem>>,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    pub fn snapshots(&self) -> watch::Receiver<Vec<StreamItem>> {
        self.snapshots.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_none()
    }

    /// Cancel the subscription and wait for the release to finish.
    /// Calling this again is a no-op.
    pub async fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // The task may already have finished on its own
            let _ = stop_tx.send(());
        }

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "Stream synchronizer task failed");
            }
        }
    }
}
