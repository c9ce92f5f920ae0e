//! # pulse-proto
//!
//! Wire types for the GearPulse activity feed: the inbound activity
//! envelope, outbound client messages, and the bodies exchanged with the
//! polling endpoints.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod envelope;
pub mod error;
pub mod messages;

pub use envelope::{ActivityEnvelope, FeedSnapshot, PresencePing};
pub use error::ProtoError;
pub use messages::ClientMessage;
