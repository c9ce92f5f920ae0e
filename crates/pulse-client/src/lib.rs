//! # pulse-client
//!
//! GearPulse activity-feed client: a realtime WebSocket transport with
//! bounded reconnection, and an automatic failover to HTTP snapshot
//! polling when the realtime channel is unavailable.
//!
//! The transport is explicitly constructed and owned — share it behind an
//! [`std::sync::Arc`] and tear it down with
//! [`transport::RealtimeTransport::disconnect`] when the application
//! shuts down.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod feed;
pub mod transport;

pub use config::FeedConfig;
pub use error::ClientError;
pub use feed::{ActivityFeed, FeedStore};
pub use transport::{
    ConnectionState, EventKind, FeedEvent, ListenerId, RealtimeTransport, ReconnectConfig,
};
