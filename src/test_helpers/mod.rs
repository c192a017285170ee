// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

use crate::config::{Config, LogFormat};
use crate::feed::EventSource;
use crate::streams::StreamEvent;

/// Event source fed by a test through an mpsc sender.
/// Counts subscribe and unsubscribe calls.
pub struct ChannelEventSource {
    receiver: Mutex<Option<mpsc::Receiver<StreamEvent>>>,
    subscribe_calls: AtomicUsize,
    unsubscribe_calls: AtomicUsize,
}

impl ChannelEventSource {
    pub fn new() -> (Self, mpsc::Sender<StreamEvent>) {
        let (tx, rx) = mpsc::channel(64);
        let source = Self {
            receiver: Mutex::new(Some(rx)),
            subscribe_calls: AtomicUsize::new(0),
            unsubscribe_calls: AtomicUsize::new(0),
        };
        (source, tx)
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_calls(&self) -> usize {
        self.unsubscribe_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for ChannelEventSource {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<StreamEvent>> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        let receiver = match self.receiver.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        receiver.ok_or_else(|| anyhow::anyhow!("already subscribed"))
    }

    async fn unsubscribe(&self) -> anyhow::Result<()> {
        self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Event source whose subscribe always fails
#[derive(Default)]
pub struct FailingEventSource {
    unsubscribe_calls: AtomicUsize,
}

impl FailingEventSource {
    pub fn unsubscribe_calls(&self) -> usize {
        self.unsubscribe_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for FailingEventSource {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<StreamEvent>> {
        Err(anyhow::anyhow!("connection refused"))
    }

    async fn unsubscribe(&self) -> anyhow::Result<()> {
        self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Event source whose subscribe never completes
#[derive(Default)]
pub struct PendingEventSource {
    unsubscribe_calls: AtomicUsize,
}

impl PendingEventSource {
    pub fn unsubscribe_calls(&self) -> usize {
        self.unsubscribe_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for PendingEventSource {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<StreamEvent>> {
        std::future::pending().await
    }

    async fn unsubscribe(&self) -> anyhow::Result<()> {
        self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Create a test configuration pointing at local endpoints
pub fn create_test_config() -> Config {
    Config {
        server_url: "ws://127.0.0.1:8090/api/websocket".to_string(),
        api_base_url: "http://127.0.0.1:8090".to_string(),
        instance: "simulator".to_string(),
        api_key: None,
        local_api_bind: SocketAddr::from_str("127.0.0.1:0").unwrap(), // Use port 0 to auto-assign
        seed_from_archive: false,
        event_buffer: 16,
        log_level: "error".to_string(), // Reduce log noise in tests
        log_format: LogFormat::Pretty,
    }
}
