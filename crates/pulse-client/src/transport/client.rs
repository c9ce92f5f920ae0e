//! Realtime transport client.
//!
//! Owns at most one live WebSocket connection, emits lifecycle and message
//! events to subscribers, and recovers from transient failures with a
//! bounded linear backoff.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use pulse_proto::{ActivityEnvelope, ClientMessage};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Notify};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::config::FeedConfig;
use crate::error::ClientError;

use super::events::{EventKind, FeedEvent};
use super::listeners::{ListenerId, ListenerRegistry};
use super::reconnect::ReconnectConfig;
use super::state::{AtomicConnectionState, ConnectionState};

/// Close code for a deliberate, clean shutdown.
pub const NORMAL_CLOSURE: u16 = 1000;
/// Close code reported when the link dropped without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;
/// Close code reported when the peer sent a close frame with no status.
pub const NO_STATUS: u16 = 1005;

const OUTBOUND_BUFFER: usize = 32;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct CloseInfo {
    code: u16,
    reason: String,
}

/// Shared state between the transport handle and its connection task.
struct TransportShared {
    state: AtomicConnectionState,
    /// True while a connection task owns the transport (connecting, open,
    /// or waiting out a reconnect delay).
    running: AtomicBool,
    /// Latched by `disconnect`; a pending reconnect timer must observe
    /// this before acting.
    intentional_close: AtomicBool,
    /// Consecutive failed attempts since the last successful open.
    attempts: AtomicU32,
    /// Wakes the connection task out of its current await on `disconnect`.
    close_notify: Notify,
    listeners: ListenerRegistry,
    outbound: Mutex<Option<mpsc::Sender<ClientMessage>>>,
}

/// Realtime activity-feed transport.
///
/// Explicitly constructed and owned; share it behind an [`Arc`] with
/// whichever components consume it. None of the operational methods
/// return errors or panic — failures surface as [`FeedEvent`]s.
pub struct RealtimeTransport {
    endpoint: Url,
    reconnect: ReconnectConfig,
    inner: Arc<TransportShared>,
}

impl RealtimeTransport {
    /// Create a transport targeting the given realtime endpoint.
    #[must_use]
    pub fn new(endpoint: Url, reconnect: ReconnectConfig) -> Self {
        Self {
            endpoint,
            reconnect,
            inner: Arc::new(TransportShared {
                state: AtomicConnectionState::new(ConnectionState::Idle),
                running: AtomicBool::new(false),
                intentional_close: AtomicBool::new(false),
                attempts: AtomicU32::new(0),
                close_notify: Notify::new(),
                listeners: ListenerRegistry::new(),
                outbound: Mutex::new(None),
            }),
        }
    }

    /// Create a transport from a feed configuration, deriving the realtime
    /// endpoint from the API base (`https` base yields `wss`, `http`
    /// yields `ws`; mixed security is never attempted).
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &FeedConfig) -> Result<Self, ClientError> {
        config.validate()?;
        Ok(Self::new(
            config.realtime_endpoint()?,
            config.reconnect.clone(),
        ))
    }

    /// Get the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.state.load()
    }

    /// Check whether the connection is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Consecutive failed connection attempts since the last successful
    /// open. Zero while the connection is healthy.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// Register a handler for an event kind. Handlers fire synchronously,
    /// in registration order, from the transport's own processing.
    pub fn on(
        &self,
        kind: EventKind,
        handler: impl Fn(&FeedEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.inner.listeners.on(kind, handler)
    }

    /// Deregister a handler. Unknown ids are ignored.
    pub fn off(&self, kind: EventKind, id: ListenerId) {
        self.inner.listeners.off(kind, id);
    }

    /// Start connecting, spawning the connection task.
    ///
    /// A no-op (logged, not an error) while a connection is already open,
    /// in flight, or waiting out a reconnect delay. The optional endpoint
    /// overrides the configured one for this cycle. Must be called from
    /// within a tokio runtime; the outcome is observed through events and
    /// [`Self::state`], never a return value.
    pub fn connect(&self, endpoint: Option<Url>) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            tracing::debug!("connect ignored: connection already active");
            return;
        }

        self.inner.intentional_close.store(false, Ordering::SeqCst);
        self.inner.attempts.store(0, Ordering::SeqCst);
        self.inner.state.store(ConnectionState::Connecting);

        let url = endpoint.unwrap_or_else(|| self.endpoint.clone());
        let inner = Arc::clone(&self.inner);
        let reconnect = self.reconnect.clone();
        tokio::spawn(async move {
            connection_loop(&inner, &url, &reconnect).await;
        });
    }

    /// Send a message over the live connection.
    ///
    /// Delivered only if the connection is open; otherwise the message is
    /// dropped with a warning. No queueing, no retry of unsent messages.
    pub fn send(&self, message: &ClientMessage) {
        if self.state() != ConnectionState::Open {
            tracing::warn!(state = ?self.state(), "dropping outbound message: connection not open");
            return;
        }

        let tx = self.inner.outbound.lock().clone();
        match tx {
            Some(tx) => {
                if let Err(e) = tx.try_send(message.clone()) {
                    tracing::warn!(error = %e, "dropping outbound message");
                }
            }
            None => {
                tracing::warn!("dropping outbound message: connection not open");
            }
        }
    }

    /// Tear down deterministically: close the connection with a normal
    /// code, clear every listener registration, reset the reconnect
    /// counter, and suppress any pending automatic reconnect.
    pub fn disconnect(&self) {
        tracing::info!("disconnecting realtime transport");
        self.inner.intentional_close.store(true, Ordering::SeqCst);

        if self.inner.running.load(Ordering::SeqCst) {
            if matches!(
                self.state(),
                ConnectionState::Open | ConnectionState::Connecting
            ) {
                self.inner.state.store(ConnectionState::Closing);
            }
            self.inner.close_notify.notify_one();
        } else {
            self.inner.state.store(ConnectionState::Closed);
        }

        self.inner.attempts.store(0, Ordering::SeqCst);
        self.inner.listeners.clear();
    }
}

impl std::fmt::Debug for RealtimeTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeTransport")
            .field("endpoint", &self.endpoint.as_str())
            .field("state", &self.state())
            .finish()
    }
}

/// Release ownership of the transport before any terminal dispatch, so a
/// handler reacting to the final event may call `connect()` again.
fn release(inner: &TransportShared) {
    inner.state.store(ConnectionState::Closed);
    inner.running.store(false, Ordering::SeqCst);
}

async fn connection_loop(inner: &Arc<TransportShared>, url: &Url, reconnect: &ReconnectConfig) {
    loop {
        if inner.intentional_close.load(Ordering::SeqCst) {
            release(inner);
            return;
        }
        inner.state.store(ConnectionState::Connecting);
        tracing::debug!(url = %url, "connecting");

        match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((ws, _)) => {
                if inner.intentional_close.load(Ordering::SeqCst) {
                    let mut ws = ws;
                    let _ = ws.close(None).await;
                    release(inner);
                    return;
                }

                inner.attempts.store(0, Ordering::SeqCst);
                let (write, read) = ws.split();
                let (tx, rx) = mpsc::channel::<ClientMessage>(OUTBOUND_BUFFER);
                *inner.outbound.lock() = Some(tx);
                inner.state.store(ConnectionState::Open);
                tracing::info!(url = %url, "realtime connection established");
                inner.listeners.dispatch(&FeedEvent::Connected);

                let close = run_connection(read, write, rx, inner).await;

                *inner.outbound.lock() = None;
                tracing::info!(code = close.code, reason = %close.reason, "realtime connection closed");

                // A deliberate or normal close is terminal: no reconnect.
                if inner.intentional_close.load(Ordering::SeqCst) || close.code == NORMAL_CLOSURE {
                    release(inner);
                    inner.listeners.dispatch(&FeedEvent::Disconnected {
                        code: close.code,
                        reason: close.reason,
                    });
                    return;
                }

                inner.state.store(ConnectionState::Closed);
                inner.listeners.dispatch(&FeedEvent::Disconnected {
                    code: close.code,
                    reason: close.reason,
                });
            }
            Err(e) => {
                inner.state.store(ConnectionState::Closed);
                tracing::warn!(url = %url, error = %e, "connection attempt failed");
                inner
                    .listeners
                    .dispatch(&FeedEvent::Error(format!("connect failed: {e}")));

                if inner.intentional_close.load(Ordering::SeqCst) {
                    release(inner);
                    return;
                }
            }
        }

        // Unexpected close or failed attempt: schedule exactly one retry,
        // or give up once the budget is spent.
        let attempt = inner.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if !reconnect.should_reconnect(attempt) {
            tracing::warn!(attempts = attempt, "reconnect budget exhausted");
            release(inner);
            inner.listeners.dispatch(&FeedEvent::ReconnectFailed);
            return;
        }

        let delay = reconnect.delay_for_attempt(attempt);
        tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "scheduling reconnect");
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = inner.close_notify.notified() => {}
        }
    }
}

async fn run_connection(
    mut read: SplitStream<WsStream>,
    mut write: SplitSink<WsStream, Message>,
    mut outbound_rx: mpsc::Receiver<ClientMessage>,
    inner: &TransportShared,
) -> CloseInfo {
    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => match ActivityEnvelope::from_json(&text) {
                    Ok(envelope) => inner.listeners.dispatch(&FeedEvent::Message(envelope)),
                    Err(e) => {
                        // Malformed frames are dropped; the connection stays open.
                        tracing::warn!(error = %e, "dropping malformed frame");
                        inner
                            .listeners
                            .dispatch(&FeedEvent::Error(format!("malformed frame: {e}")));
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    return frame.map_or(
                        CloseInfo {
                            code: NO_STATUS,
                            reason: String::new(),
                        },
                        |f| CloseInfo {
                            code: u16::from(f.code),
                            reason: f.reason.to_string(),
                        },
                    );
                }
                Some(Ok(_)) => {
                    // Ping, pong, and binary frames are not part of the feed.
                }
                Some(Err(e)) => {
                    inner
                        .listeners
                        .dispatch(&FeedEvent::Error(format!("connection error: {e}")));
                    return CloseInfo {
                        code: ABNORMAL_CLOSURE,
                        reason: e.to_string(),
                    };
                }
                None => {
                    return CloseInfo {
                        code: ABNORMAL_CLOSURE,
                        reason: "connection closed".to_string(),
                    };
                }
            },
            message = outbound_rx.recv() => {
                if let Some(message) = message {
                    match message.to_json() {
                        Ok(json) => {
                            if write.send(Message::Text(json)).await.is_err() {
                                return CloseInfo {
                                    code: ABNORMAL_CLOSURE,
                                    reason: "write failed".to_string(),
                                };
                            }
                        }
                        Err(e) => {
                            inner
                                .listeners
                                .dispatch(&FeedEvent::Error(format!("encode failed: {e}")));
                        }
                    }
                }
            }
            () = inner.close_notify.notified() => {
                if inner.intentional_close.load(Ordering::SeqCst) {
                    let _ = write
                        .send(Message::Close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: "client disconnect".into(),
                        })))
                        .await;
                    return CloseInfo {
                        code: NORMAL_CLOSURE,
                        reason: "client disconnect".to_string(),
                    };
                }
            }
        }
    }
}
