//! Activity feed consumer.
//!
//! Bridges the realtime transport and the polling fallback: live messages
//! land in the store as they arrive; when the realtime channel cannot be
//! established within the grace period (or drops and exhausts its retry
//! budget), a periodic snapshot poll takes over until realtime
//! connectivity is confirmed again. The two refresh mechanisms never run
//! against an open connection at the same time.

mod poller;
mod presence;
mod store;

pub use poller::PollerHandle;
pub use presence::PresenceHandle;
pub use store::FeedStore;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pulse_proto::{ActivityEnvelope, ClientMessage};
use url::Url;

use crate::config::FeedConfig;
use crate::error::ClientError;
use crate::transport::{EventKind, FeedEvent, ListenerId, RealtimeTransport};

use poller::start_poll_task;
use presence::start_presence_task;

/// State shared with the transport listeners and background tasks.
struct FeedShared {
    store: FeedStore,
    http: reqwest::Client,
    feed_url: Url,
    poll_interval: Duration,
    poller: Mutex<Option<PollerHandle>>,
    realtime_seen: AtomicBool,
}

impl FeedShared {
    /// Start the polling fallback unless it is already active.
    fn activate_polling(&self) {
        let mut slot = self.poller.lock();
        if slot.as_ref().is_some_and(PollerHandle::is_running) {
            return;
        }
        tracing::info!("activating polling fallback");
        *slot = Some(start_poll_task(
            self.http.clone(),
            self.feed_url.clone(),
            self.poll_interval,
            self.store.clone(),
        ));
    }

    /// Cancel the polling fallback if it is active.
    fn deactivate_polling(&self) {
        if let Some(handle) = self.poller.lock().take() {
            tracing::info!("cancelling polling fallback");
            handle.stop();
        }
    }
}

/// Live activity feed backed by the realtime transport, with automatic
/// failover to snapshot polling.
pub struct ActivityFeed {
    transport: Arc<RealtimeTransport>,
    shared: Arc<FeedShared>,
    channels: Vec<String>,
    session_id: String,
    presence_url: Url,
    presence_interval: Duration,
    grace_period: Duration,
    presence: Mutex<Option<PresenceHandle>>,
    grace: Mutex<Option<tokio::task::JoinHandle<()>>>,
    listener_ids: Mutex<Vec<(EventKind, ListenerId)>>,
}

impl ActivityFeed {
    /// Create a feed over the given transport.
    ///
    /// The session id identifies this viewer for presence tracking; it is
    /// the caller's to persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(
        transport: Arc<RealtimeTransport>,
        config: &FeedConfig,
        session_id: impl Into<String>,
    ) -> Result<Self, ClientError> {
        config.validate()?;

        let shared = Arc::new(FeedShared {
            store: FeedStore::new(config.feed_capacity),
            http: reqwest::Client::new(),
            feed_url: config.feed_url()?,
            poll_interval: config.poll_interval(),
            poller: Mutex::new(None),
            realtime_seen: AtomicBool::new(false),
        });

        Ok(Self {
            transport,
            shared,
            channels: config.channels.clone(),
            session_id: session_id.into(),
            presence_url: config.presence_url()?,
            presence_interval: config.presence_interval(),
            grace_period: config.grace_period(),
            presence: Mutex::new(None),
            grace: Mutex::new(None),
            listener_ids: Mutex::new(Vec::new()),
        })
    }

    /// Start the feed: wire transport listeners, begin presence pings,
    /// arm the grace-period fallback, and connect.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        self.register_listeners();

        *self.presence.lock() = Some(start_presence_task(
            self.shared.http.clone(),
            self.presence_url.clone(),
            self.session_id.clone(),
            self.presence_interval,
        ));

        // If realtime does not come up within the grace period, fall back
        // to polling until a `Connected` event cancels it.
        let shared = Arc::clone(&self.shared);
        let transport = Arc::clone(&self.transport);
        let grace = self.grace_period;
        *self.grace.lock() = Some(tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if shared.realtime_seen.load(Ordering::SeqCst) || transport.is_open() {
                return;
            }
            tracing::info!(
                grace_ms = grace.as_millis() as u64,
                "no realtime connection within grace period"
            );
            shared.activate_polling();
            // The connection may have opened while we were activating.
            if transport.is_open() {
                shared.deactivate_polling();
            }
        }));

        self.transport.connect(None);
    }

    /// Current feed contents, newest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ActivityEnvelope> {
        self.shared.store.snapshot()
    }

    /// Whether the polling fallback is currently active.
    #[must_use]
    pub fn polling_active(&self) -> bool {
        self.shared
            .poller
            .lock()
            .as_ref()
            .is_some_and(PollerHandle::is_running)
    }

    /// The transport this feed consumes.
    #[must_use]
    pub fn transport(&self) -> &Arc<RealtimeTransport> {
        &self.transport
    }

    /// Stop everything: grace task, presence pings, polling, listeners,
    /// and the transport itself.
    pub fn stop(&self) {
        if let Some(task) = self.grace.lock().take() {
            task.abort();
        }
        if let Some(handle) = self.presence.lock().take() {
            handle.stop();
        }
        self.shared.deactivate_polling();

        let ids = std::mem::take(&mut *self.listener_ids.lock());
        for (kind, id) in ids {
            self.transport.off(kind, id);
        }

        self.transport.disconnect();
    }

    fn register_listeners(&self) {
        let mut ids = self.listener_ids.lock();

        let shared = Arc::clone(&self.shared);
        let transport = Arc::clone(&self.transport);
        let channels = self.channels.clone();
        ids.push((
            EventKind::Connected,
            self.transport.on(EventKind::Connected, move |_| {
                shared.realtime_seen.store(true, Ordering::SeqCst);
                shared.deactivate_polling();
                transport.send(&ClientMessage::subscribe(channels.clone()));
            }),
        ));

        let shared = Arc::clone(&self.shared);
        ids.push((
            EventKind::Message,
            self.transport.on(EventKind::Message, move |event| {
                if let FeedEvent::Message(envelope) = event {
                    shared.store.push(envelope.clone());
                }
            }),
        ));

        let shared = Arc::clone(&self.shared);
        ids.push((
            EventKind::Disconnected,
            self.transport.on(EventKind::Disconnected, move |_| {
                shared.activate_polling();
            }),
        ));

        let shared = Arc::clone(&self.shared);
        ids.push((
            EventKind::ReconnectFailed,
            self.transport.on(EventKind::ReconnectFailed, move |_| {
                shared.activate_polling();
            }),
        ));
    }
}

impl std::fmt::Debug for ActivityFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityFeed")
            .field("session_id", &self.session_id)
            .field("polling_active", &self.polling_active())
            .finish()
    }
}
