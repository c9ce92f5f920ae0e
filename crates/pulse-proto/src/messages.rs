//! Outbound message definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ProtoError;

/// Messages sent from the client to the feed backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to one or more activity channels.
    Subscribe {
        /// Channel names (e.g. `marketplace`, `group_buys`).
        channels: Vec<String>,
    },
    /// Unsubscribe from channels.
    Unsubscribe {
        /// Channel names.
        channels: Vec<String>,
    },
    /// Presence announcement for the current viewer.
    Presence {
        /// Opaque session identifier.
        session_id: String,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl ClientMessage {
    /// Create a subscribe message.
    #[must_use]
    pub fn subscribe(channels: Vec<String>) -> Self {
        Self::Subscribe { channels }
    }

    /// Create an unsubscribe message.
    #[must_use]
    pub fn unsubscribe(channels: Vec<String>) -> Self {
        Self::Unsubscribe { channels }
    }

    /// Create a presence message stamped with the current time.
    #[must_use]
    pub fn presence(session_id: impl Into<String>) -> Self {
        Self::Presence {
            session_id: session_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}
