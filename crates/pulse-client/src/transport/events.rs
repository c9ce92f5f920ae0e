//! Transport event types.

use pulse_proto::ActivityEnvelope;

/// Events emitted by the realtime transport.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// Connection established.
    Connected,
    /// An activity frame was received and parsed.
    Message(ActivityEnvelope),
    /// Connection-level or parse-level failure; not necessarily fatal.
    Error(String),
    /// Connection closed, for any reason.
    Disconnected {
        /// Close code reported by the peer (1006 when the link dropped
        /// without a close frame).
        code: u16,
        /// Close reason, possibly empty.
        reason: String,
    },
    /// The reconnection budget is exhausted; no further automatic
    /// attempts will be made until an explicit `connect`.
    ReconnectFailed,
}

impl FeedEvent {
    /// The subscription key for this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Connected => EventKind::Connected,
            Self::Message(_) => EventKind::Message,
            Self::Error(_) => EventKind::Error,
            Self::Disconnected { .. } => EventKind::Disconnected,
            Self::ReconnectFailed => EventKind::ReconnectFailed,
        }
    }
}

/// Payload-free discriminant of [`FeedEvent`], used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Connection established.
    Connected,
    /// Activity frame received.
    Message,
    /// Connection-level or parse-level failure.
    Error,
    /// Connection closed.
    Disconnected,
    /// Retry budget exhausted.
    ReconnectFailed,
}
