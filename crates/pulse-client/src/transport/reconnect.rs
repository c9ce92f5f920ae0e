//! Reconnection policy: linear backoff with a bounded retry budget.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for reconnection behavior.
///
/// The delay before attempt *n* grows linearly: `base_delay × n`, capped
/// at `max_delay`. The counter resets to zero on every successful
/// connection, so a long-lived connection that later drops gets the full
/// budget again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound on any reconnection delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Consecutive failures tolerated before giving up.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            max_attempts: 5,
        }
    }
}

impl ReconnectConfig {
    /// Calculate the delay for the given attempt number.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = Duration::from_millis(self.base_delay_ms).saturating_mul(attempt);
        delay.min(Duration::from_millis(self.max_delay_ms))
    }

    /// Check whether another reconnection attempt should be scheduled.
    #[must_use]
    pub const fn should_reconnect(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test]
    fn test_reconnect_config_default() {
        let config = ReconnectConfig::default();
        assert_eq!(config.base_delay_ms, 1_000);
        assert_eq!(config.max_delay_ms, 30_000);
        assert_eq!(config.max_attempts, 5);
    }

    #[test_case(1, 1_000; "first attempt")]
    #[test_case(2, 2_000; "second attempt")]
    #[test_case(3, 3_000; "third attempt")]
    #[test_case(5, 5_000; "fifth attempt")]
    #[test_case(40, 30_000; "capped at max delay")]
    fn test_delay_is_linear(attempt: u32, expected_ms: u64) {
        let config = ReconnectConfig::default();
        assert_eq!(
            config.delay_for_attempt(attempt),
            Duration::from_millis(expected_ms)
        );
    }

    #[test]
    fn test_should_reconnect_within_budget() {
        let config = ReconnectConfig {
            max_attempts: 5,
            ..Default::default()
        };

        assert!(config.should_reconnect(1));
        assert!(config.should_reconnect(4));
        assert!(!config.should_reconnect(5));
        assert!(!config.should_reconnect(6));
    }

    #[test]
    fn test_delay_with_zero_attempt() {
        let config = ReconnectConfig::default();
        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);
    }

    proptest! {
        #[test]
        fn test_delay_is_non_decreasing(
            base in 1u64..5_000,
            max in 1u64..120_000,
            attempt in 1u32..1_000,
        ) {
            let config = ReconnectConfig {
                base_delay_ms: base,
                max_delay_ms: max,
                max_attempts: 5,
            };
            prop_assert!(
                config.delay_for_attempt(attempt) <= config.delay_for_attempt(attempt + 1)
            );
        }

        #[test]
        fn test_delay_never_exceeds_cap(
            base in 1u64..5_000,
            max in 1u64..120_000,
            attempt in 0u32..10_000,
        ) {
            let config = ReconnectConfig {
                base_delay_ms: base,
                max_delay_ms: max,
                max_attempts: 5,
            };
            prop_assert!(config.delay_for_attempt(attempt) <= Duration::from_millis(max));
        }
    }
}
