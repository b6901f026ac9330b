//! Shared retry and backoff configuration.
//!
//! The only retry loop in this subsystem is the aggregate-stat polling loop:
//! the upstream computes commit-activity style statistics asynchronously and
//! answers HTTP 202 until the result is ready. That loop is a protocol
//! feature, not error recovery, so it gets its own bounded backoff here while
//! all other upstream failures surface as typed errors immediately.

use std::time::Duration;

use backon::ExponentialBuilder;

/// Base delay before the first aggregate-stat re-poll.
pub const STAT_POLL_BASE_DELAY_MS: u64 = 500;

/// Growth factor between consecutive poll delays.
pub const STAT_POLL_FACTOR: f32 = 1.7;

/// Cap on a single poll delay.
pub const STAT_POLL_MAX_DELAY_MS: u64 = 8_000;

/// Maximum number of re-polls before giving up with `ServiceUnavailable`.
pub const STAT_POLL_MAX_ATTEMPTS: usize = 6;

/// Configuration for retry operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Minimum delay between retries.
    pub min_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each attempt.
    pub factor: f32,
    /// Maximum number of retry attempts.
    pub max_retries: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(STAT_POLL_BASE_DELAY_MS),
            max_delay: Duration::from_millis(STAT_POLL_MAX_DELAY_MS),
            factor: STAT_POLL_FACTOR,
            max_retries: STAT_POLL_MAX_ATTEMPTS,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with custom values.
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration, factor: f32, max_retries: usize) -> Self {
        Self {
            min_delay,
            max_delay,
            factor,
            max_retries,
        }
    }

    /// Build an exponential backoff strategy from this configuration.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_factor(self.factor)
            .with_max_times(self.max_retries)
    }
}

/// Build the backoff strategy for the aggregate-stat polling loop.
///
/// # Example
///
/// ```ignore
/// use backon::Retryable;
/// use gitpulse::retry::stat_poll_backoff;
///
/// let result = operation
///     .retry(stat_poll_backoff())
///     .when(|e| e.is_still_computing())
///     .await;
/// ```
#[must_use]
pub fn stat_poll_backoff() -> ExponentialBuilder {
    RetryConfig::default().into_backoff()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_config_default_matches_poll_constants() {
        let config = RetryConfig::default();

        assert_eq!(config.min_delay, Duration::from_millis(STAT_POLL_BASE_DELAY_MS));
        assert_eq!(config.max_delay, Duration::from_millis(STAT_POLL_MAX_DELAY_MS));
        assert_eq!(config.factor, STAT_POLL_FACTOR);
        assert_eq!(config.max_retries, STAT_POLL_MAX_ATTEMPTS);
    }

    #[test]
    fn retry_config_custom_values() {
        let config = RetryConfig::new(Duration::from_secs(1), Duration::from_secs(30), 2.0, 3);

        assert_eq!(config.min_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn stat_poll_backoff_creates_builder() {
        let _backoff = stat_poll_backoff();
    }
}
