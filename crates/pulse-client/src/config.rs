//! Feed client configuration.
//!
//! Configuration for the GearPulse feed client, including:
//! - API base address and endpoint paths
//! - Realtime grace period and polling cadence
//! - Reconnection policy

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ClientError;
use crate::transport::ReconnectConfig;

fn default_realtime_path() -> String {
    "realtime".to_string()
}

fn default_feed_path() -> String {
    "activity/feed".to_string()
}

fn default_presence_path() -> String {
    "activity/presence".to_string()
}

fn default_channels() -> Vec<String> {
    vec!["marketplace".to_string()]
}

const fn default_grace_period_ms() -> u64 {
    5_000
}

const fn default_poll_interval_ms() -> u64 {
    30_000
}

const fn default_presence_interval_ms() -> u64 {
    60_000
}

const fn default_feed_capacity() -> usize {
    100
}

/// Main feed client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedConfig {
    /// HTTP API base, e.g. `https://gear.example.com/api`.
    pub api_base: String,
    /// Path of the realtime endpoint, joined onto `api_base`.
    #[serde(default = "default_realtime_path")]
    pub realtime_path: String,
    /// Path of the feed-snapshot endpoint, joined onto `api_base`.
    #[serde(default = "default_feed_path")]
    pub feed_path: String,
    /// Path of the presence-ping endpoint, joined onto `api_base`.
    #[serde(default = "default_presence_path")]
    pub presence_path: String,
    /// Explicit realtime endpoint (`ws://` or `wss://`). When set, it is
    /// used verbatim instead of deriving from `api_base`.
    #[serde(default)]
    pub realtime_url: Option<String>,
    /// Activity channels to subscribe to once connected.
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,
    /// How long to wait for a realtime connection before the polling
    /// fallback starts, in milliseconds.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,
    /// Polling cadence while the fallback is active, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Presence ping cadence, in milliseconds.
    #[serde(default = "default_presence_interval_ms")]
    pub presence_interval_ms: u64,
    /// Reconnection policy.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    /// How many activity items the in-memory feed retains.
    #[serde(default = "default_feed_capacity")]
    pub feed_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_base: "https://localhost:8443/api".to_string(),
            realtime_path: default_realtime_path(),
            feed_path: default_feed_path(),
            presence_path: default_presence_path(),
            realtime_url: None,
            channels: default_channels(),
            grace_period_ms: default_grace_period_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            presence_interval_ms: default_presence_interval_ms(),
            reconnect: ReconnectConfig::default(),
            feed_capacity: default_feed_capacity(),
        }
    }
}

impl FeedConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ClientError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid.
    pub fn from_json(content: &str) -> Result<Self, ClientError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| ClientError::Config(format!("invalid JSON: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Set the API base.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set an explicit realtime endpoint.
    #[must_use]
    pub fn with_realtime_url(mut self, url: impl Into<String>) -> Self {
        self.realtime_url = Some(url.into());
        self
    }

    /// Set the subscribed channels.
    #[must_use]
    pub fn with_channels(mut self, channels: Vec<String>) -> Self {
        self.channels = channels;
        self
    }

    /// Set the grace period in milliseconds.
    #[must_use]
    pub const fn with_grace_period_ms(mut self, ms: u64) -> Self {
        self.grace_period_ms = ms;
        self
    }

    /// Set the poll interval in milliseconds.
    #[must_use]
    pub const fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the presence interval in milliseconds.
    #[must_use]
    pub const fn with_presence_interval_ms(mut self, ms: u64) -> Self {
        self.presence_interval_ms = ms;
        self
    }

    /// Set the reconnection policy.
    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.api_base.is_empty() {
            return Err(ClientError::Config("api_base cannot be empty".to_string()));
        }

        let base = Url::parse(&self.api_base)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "api_base must use http or https, got {}",
                base.scheme()
            )));
        }

        if let Some(raw) = &self.realtime_url {
            let url = Url::parse(raw)?;
            if !matches!(url.scheme(), "ws" | "wss") {
                return Err(ClientError::Config(format!(
                    "realtime_url must use ws or wss, got {}",
                    url.scheme()
                )));
            }
        }

        for (name, path) in [
            ("realtime_path", &self.realtime_path),
            ("feed_path", &self.feed_path),
            ("presence_path", &self.presence_path),
        ] {
            if path.is_empty() {
                return Err(ClientError::Config(format!("{name} cannot be empty")));
            }
        }

        if self.poll_interval_ms == 0 {
            return Err(ClientError::Config(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }

        if self.presence_interval_ms == 0 {
            return Err(ClientError::Config(
                "presence_interval_ms must be greater than zero".to_string(),
            ));
        }

        if self.reconnect.base_delay_ms == 0 {
            return Err(ClientError::Config(
                "reconnect.base_delay_ms must be greater than zero".to_string(),
            ));
        }

        if self.reconnect.max_attempts == 0 {
            return Err(ClientError::Config(
                "reconnect.max_attempts must be greater than zero".to_string(),
            ));
        }

        if self.feed_capacity == 0 {
            return Err(ClientError::Config(
                "feed_capacity must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// The realtime endpoint.
    ///
    /// When `realtime_url` is set it is used verbatim. Otherwise the
    /// endpoint is derived from `api_base` by joining `realtime_path` and
    /// mapping the scheme: a secure base yields `wss`, an insecure one
    /// `ws`. Mixed security levels are never produced.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured addresses cannot be parsed.
    pub fn realtime_endpoint(&self) -> Result<Url, ClientError> {
        if let Some(raw) = &self.realtime_url {
            let url = Url::parse(raw)?;
            if !matches!(url.scheme(), "ws" | "wss") {
                return Err(ClientError::Config(format!(
                    "realtime_url must use ws or wss, got {}",
                    url.scheme()
                )));
            }
            return Ok(url);
        }

        let mut url = self.endpoint(&self.realtime_path)?;
        let scheme = match url.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => {
                return Err(ClientError::Config(format!(
                    "cannot derive realtime scheme from {other}"
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| ClientError::Config("cannot derive realtime scheme".to_string()))?;
        Ok(url)
    }

    /// The feed-snapshot endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured addresses cannot be parsed.
    pub fn feed_url(&self) -> Result<Url, ClientError> {
        self.endpoint(&self.feed_path)
    }

    /// The presence-ping endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured addresses cannot be parsed.
    pub fn presence_url(&self) -> Result<Url, ClientError> {
        self.endpoint(&self.presence_path)
    }

    /// Grace period before the polling fallback starts.
    #[must_use]
    pub const fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    /// Polling cadence.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Presence ping cadence.
    #[must_use]
    pub const fn presence_interval(&self) -> Duration {
        Duration::from_millis(self.presence_interval_ms)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        let mut base = Url::parse(&self.api_base)?;
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }
        Ok(base.join(path.trim_start_matches('/'))?)
    }
}
