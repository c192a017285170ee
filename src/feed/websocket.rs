// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::feed::error::FeedError;
use crate::feed::traits::{ConnectionCallback, EventSource};
use crate::streams::StreamEvent;

/// Topic name of stream event calls, also used as the message type of pushed events
const STREAM_EVENTS_TOPIC: &str = "stream-events";

const DEFAULT_BUFFER: usize = 1024;

/// How long an unsubscribe waits for the cancel and close frames to be flushed
const RELEASE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct ClientMessage<'a> {
    #[serde(rename = "type")]
    msg_type: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u32>,

    options: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ServerMessage {
    #[serde(rename = "type")]
    msg_type: String,

    #[serde(default)]
    call: Option<u32>,

    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// What the reader does after a frame
#[derive(Debug, PartialEq, Eq)]
enum FrameOutcome {
    Continue,
    /// The event receiver was dropped
    ConsumerGone,
    /// The server refused the call, nothing more will arrive on it
    Rejected,
}

/// Bookkeeping for the single open call
struct ActiveCall {
    outbound: mpsc::UnboundedSender<Message>,
    call: Arc<Mutex<Option<u32>>>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

/// Stream event feed over the server's WebSocket call protocol.
///
/// One connection carries one `stream-events` call. `subscribe` opens the
/// connection and the call, `unsubscribe` cancels the call and closes the
/// connection. There is no automatic reconnection.
pub struct WebSocketEventSource {
    url: Url,
    instance: String,
    api_key: Option<String>,
    buffer: usize,
    callback: Arc<dyn ConnectionCallback>,
    active: Mutex<Option<ActiveCall>>,
    next_id: AtomicU32,
}

impl WebSocketEventSource {
    pub fn new(
        server_url: &str,
        instance: impl Into<String>,
        callback: Arc<dyn ConnectionCallback>,
    ) -> Result<Self, FeedError> {
        let url = Url::parse(server_url)
            .map_err(|e| FeedError::InvalidUrl(format!("{}: {}", server_url, e)))?;

        match url.scheme() {
            "ws" | "wss" => {}
            scheme => {
                return Err(FeedError::InvalidUrl(format!(
                    "{}: unsupported scheme {} (expected ws or wss)",
                    server_url, scheme
                )));
            }
        }

        Ok(Self {
            url,
            instance: instance.into(),
            api_key: None,
            buffer: DEFAULT_BUFFER,
            callback,
            active: Mutex::new(None),
            next_id: AtomicU32::new(1),
        })
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Capacity of the event channel handed out by `subscribe`
    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }

    fn build_request(
        &self,
    ) -> anyhow::Result<tokio_tungstenite::tungstenite::handshake::client::Request> {
        let mut request = self.url.as_str().into_client_request()?;

        if let Some(ref key) = self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        Ok(request)
    }
}

#[async_trait]
impl EventSource for WebSocketEventSource {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<StreamEvent>> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(FeedError::AlreadySubscribed.into());
        }

        self.callback.connecting();

        let request = self.build_request()?;
        let (socket, _response) = match connect_async(request).await {
            Ok(pair) => pair,
            Err(e) => {
                let error = anyhow::Error::from(FeedError::from(e));
                self.callback.connection_failed(&error);
                return Err(error);
            }
        };

        self.callback.connected();

        let (mut sink, mut stream) = socket.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let (event_tx, event_rx) = mpsc::channel(self.buffer);

        let request_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let open = ClientMessage {
            msg_type: STREAM_EVENTS_TOPIC,
            id: Some(request_id),
            options: json!({ "instance": self.instance }),
        };
        outbound_tx.send(Message::Text(serde_json::to_string(&open)?))?;

        let writer = tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if let Err(e) = sink.send(msg).await {
                    error!(error = %e, "Failed to send feed message");
                    break;
                }
                if closing {
                    break;
                }
            }
        });

        let call = Arc::new(Mutex::new(None));
        let reader_call = Arc::clone(&call);
        let callback = Arc::clone(&self.callback);
        let reader = tokio::spawn(async move {
            let mut remote_closed = true;
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match handle_frame(&text, request_id, &reader_call, &event_tx).await {
                            FrameOutcome::Continue => {}
                            FrameOutcome::ConsumerGone => {
                                debug!("Stream event consumer went away");
                                remote_closed = false;
                                break;
                            }
                            FrameOutcome::Rejected => break,
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "Feed read error");
                        break;
                    }
                }
            }
            if remote_closed {
                callback.disconnected();
            }
        });

        info!(url = %self.url, instance = %self.instance, request_id, "Opened stream event call");

        *active = Some(ActiveCall {
            outbound: outbound_tx,
            call,
            reader,
            writer,
        });

        Ok(event_rx)
    }

    async fn unsubscribe(&self) -> anyhow::Result<()> {
        let Some(mut active) = self.active.lock().await.take() else {
            debug!("No active stream event call to release");
            return Ok(());
        };

        // Stop reading first so a deliberate close is not reported as a disconnect
        active.reader.abort();

        let call = *active.call.lock().await;
        if let Some(call) = call {
            let cancel = ClientMessage {
                msg_type: "cancel",
                id: None,
                options: json!({ "call": call }),
            };
            if active
                .outbound
                .send(Message::Text(serde_json::to_string(&cancel)?))
                .is_err()
            {
                debug!(call, "Feed writer already gone, cancel not sent");
            }
        }
        if active.outbound.send(Message::Close(None)).is_err() {
            debug!("Feed writer already gone, close not sent");
        }
        drop(active.outbound);

        match tokio::time::timeout(RELEASE_TIMEOUT, &mut active.writer).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Feed writer task failed"),
            Err(_) => {
                warn!("Timed out flushing feed cancel, dropping connection");
                active.writer.abort();
            }
        }

        info!(call = ?call, "Released stream event call");
        Ok(())
    }
}

async fn handle_frame(
    text: &str,
    request_id: u32,
    call: &Mutex<Option<u32>>,
    events: &mpsc::Sender<StreamEvent>,
) -> FrameOutcome {
    let message: ServerMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed feed frame");
            return FrameOutcome::Continue;
        }
    };

    match message.msg_type.as_str() {
        "reply" => {
            let reply_to = message
                .data
                .as_ref()
                .and_then(|d| d.get("replyTo"))
                .and_then(|v| v.as_u64());
            if reply_to.is_some_and(|r| r != u64::from(request_id)) {
                debug!(reply_to = ?reply_to, "Ignoring reply to another request");
                return FrameOutcome::Continue;
            }
            if let Some(exception) = message.data.as_ref().and_then(|d| d.get("exception")) {
                error!(exception = %exception, "Server rejected stream event call");
                return FrameOutcome::Rejected;
            }
            if let Some(c) = message.call {
                *call.lock().await = Some(c);
                info!(call = c, "Stream event call confirmed");
            }
            FrameOutcome::Continue
        }
        STREAM_EVENTS_TOPIC => {
            let Some(data) = message.data else {
                warn!("Stream event frame without data");
                return FrameOutcome::Continue;
            };
            match serde_json::from_value::<StreamEvent>(data) {
                Ok(event) => match events.send(event).await {
                    Ok(()) => FrameOutcome::Continue,
                    Err(_) => FrameOutcome::ConsumerGone,
                },
                Err(e) => {
                    warn!(error = %e, "Ignoring undecodable stream event");
                    FrameOutcome::Continue
                }
            }
        }
        other => {
            debug!(msg_type = %other, "Ignoring feed message");
            FrameOutcome::Continue
        }
    }
}
