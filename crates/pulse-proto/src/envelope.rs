//! Inbound envelope and polling-endpoint bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProtoError;

/// A single activity item pushed by the backend.
///
/// The client only parses the envelope: the `type` discriminator and the
/// timestamp. Everything else is carried opaquely in `body` for consumers
/// to interpret.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityEnvelope {
    /// Discriminator for the activity payload (e.g. `listing_created`).
    #[serde(rename = "type")]
    pub kind: String,
    /// When the activity happened, as reported by the backend.
    pub timestamp: DateTime<Utc>,
    /// Remaining payload fields, not interpreted by the transport.
    #[serde(flatten)]
    pub body: Value,
}

impl ActivityEnvelope {
    /// Create an envelope with an empty body.
    #[must_use]
    pub fn new(kind: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: kind.into(),
            timestamp,
            body: Value::Object(serde_json::Map::new()),
        }
    }

    /// Attach a payload body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
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
    /// Returns an error if the JSON is invalid or the envelope fields
    /// (`type`, `timestamp`) are missing.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}

/// Response body of the feed-snapshot endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FeedSnapshot {
    /// Most recent activity, newest first.
    pub activities: Vec<ActivityEnvelope>,
}

/// Body of the presence ping POST.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresencePing {
    /// Opaque session identifier supplied by the consumer.
    pub session_id: String,
    /// When the ping was issued.
    pub timestamp: DateTime<Utc>,
}

impl PresencePing {
    /// Create a ping stamped with the current time.
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_round_trip() {
        let env = ActivityEnvelope::new("listing_created", Utc::now())
            .with_body(serde_json::json!({ "listing_id": 42, "title": "RGB mousepad" }));

        let json = env.to_json().unwrap();
        let parsed = ActivityEnvelope::from_json(&json).unwrap();

        assert_eq!(parsed.kind, "listing_created");
        assert_eq!(parsed.body["listing_id"], 42);
        assert_eq!(parsed, env);
    }

    #[test]
    fn test_envelope_serializes_type_tag() {
        let env = ActivityEnvelope::new("vote_cast", Utc::now());
        let json = env.to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["type"], "vote_cast");
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn test_envelope_missing_timestamp_fails() {
        let err = ActivityEnvelope::from_json(r#"{"type":"sale"}"#).unwrap_err();
        assert!(matches!(err, ProtoError::Decoding(_)));
    }

    #[test]
    fn test_envelope_missing_type_fails() {
        let err =
            ActivityEnvelope::from_json(r#"{"timestamp":"2026-01-05T10:00:00Z"}"#).unwrap_err();
        assert!(matches!(err, ProtoError::Decoding(_)));
    }

    #[test]
    fn test_envelope_extra_fields_land_in_body() {
        let json = r#"{"type":"group_buy_joined","timestamp":"2026-01-05T10:00:00Z","user":"kira","count":7}"#;
        let env = ActivityEnvelope::from_json(json).unwrap();

        assert_eq!(env.kind, "group_buy_joined");
        assert_eq!(env.body["user"], "kira");
        assert_eq!(env.body["count"], 7);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let snapshot = FeedSnapshot {
            activities: vec![
                ActivityEnvelope::new("sale", Utc::now()),
                ActivityEnvelope::new("vote_cast", Utc::now()),
            ],
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: FeedSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.activities.len(), 2);
    }

    #[test]
    fn test_snapshot_default_is_empty() {
        let snapshot = FeedSnapshot::default();
        assert!(snapshot.activities.is_empty());
    }

    #[test]
    fn test_presence_ping_carries_session() {
        let ping = PresencePing::new("sess-123");
        let json = serde_json::to_string(&ping).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["session_id"], "sess-123");
        assert!(value.get("timestamp").is_some());
    }
}
