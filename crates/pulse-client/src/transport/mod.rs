//! Realtime WebSocket transport.
//!
//! Maintains at most one live connection to the feed backend, including
//! automatic reconnection with linear backoff and a bounded retry budget.

mod client;
mod events;
mod listeners;
mod reconnect;
mod state;

// Re-export public types
pub use client::{RealtimeTransport, ABNORMAL_CLOSURE, NORMAL_CLOSURE, NO_STATUS};
pub use events::{EventKind, FeedEvent};
pub use listeners::{ListenerId, ListenerRegistry};
pub use reconnect::ReconnectConfig;
pub use state::{AtomicConnectionState, ConnectionState};
