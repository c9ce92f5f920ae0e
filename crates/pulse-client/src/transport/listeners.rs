//! Typed listener registry.
//!
//! Subscriptions are keyed by [`EventKind`] and dispatched synchronously in
//! registration order. A panicking handler is isolated and logged; it never
//! prevents later handlers for the same event from running.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::events::{EventKind, FeedEvent};

/// Opaque handle returned by [`ListenerRegistry::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler = dyn Fn(&FeedEvent) + Send + Sync;

/// Registry of event listeners.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    handlers: Mutex<HashMap<EventKind, Vec<(ListenerId, Arc<Handler>)>>>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event kind. Handlers fire in registration
    /// order; the same handler may be registered more than once.
    pub fn on(
        &self,
        kind: EventKind,
        handler: impl Fn(&FeedEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.handlers
            .lock()
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove a handler. Removing an id that is not registered is a no-op.
    pub fn off(&self, kind: EventKind, id: ListenerId) {
        if let Some(handlers) = self.handlers.lock().get_mut(&kind) {
            handlers.retain(|(registered, _)| *registered != id);
        }
    }

    /// Remove all handlers for all event kinds.
    pub fn clear(&self) {
        self.handlers.lock().clear();
    }

    /// Number of handlers registered for an event kind.
    #[must_use]
    pub fn count(&self, kind: EventKind) -> usize {
        self.handlers.lock().get(&kind).map_or(0, Vec::len)
    }

    /// Dispatch an event to every handler registered for its kind.
    ///
    /// The registry lock is not held while handlers run, so a handler may
    /// call `on`/`off` itself; such changes take effect for the next
    /// dispatch, not the current one.
    pub fn dispatch(&self, event: &FeedEvent) {
        let snapshot: Vec<(ListenerId, Arc<Handler>)> = self
            .handlers
            .lock()
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();

        for (id, handler) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                tracing::error!(?id, kind = ?event.kind(), "listener panicked; continuing");
            }
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("handlers", &self.handlers.lock().len())
            .finish()
    }
}
