//! Upstream API error taxonomy.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur when talking to the commit API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The repository is not in the static allow-list. Raised before any I/O.
    #[error("Repository not allow-listed: {owner}/{name}")]
    Forbidden { owner: String, name: String },

    /// Authentication missing, invalid, or lacking scope.
    #[error("Authentication required")]
    Unauthorized,

    /// Resource not found upstream.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded. Carries whatever quota state the transport exposed.
    #[error("Rate limit exceeded{}", reset_suffix(.reset_at))]
    RateLimited {
        remaining: Option<u32>,
        reset_at: Option<DateTime<Utc>>,
    },

    /// The upstream is still computing an aggregate stat (HTTP 202).
    ///
    /// Internal to the polling loop; callers see `ServiceUnavailable` once
    /// the retry budget is exhausted.
    #[error("Aggregate stat still computing")]
    StatPending,

    /// An aggregate stat never became ready within the retry budget.
    #[error("Aggregate stat not ready after {attempts} attempts")]
    ServiceUnavailable { attempts: usize },

    /// Upstream 5xx or otherwise unexpected status.
    #[error("Upstream server error: HTTP {status}")]
    Server { status: u16 },

    /// Transport-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be decoded.
    #[error("Response decode error: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether this error is the polling loop's "still computing" signal.
    #[inline]
    pub fn is_still_computing(&self) -> bool {
        matches!(self, Self::StatPending)
    }

    /// Whether this error is a rate limit.
    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

fn reset_suffix(reset_at: &Option<DateTime<Utc>>) -> String {
    match reset_at {
        Some(at) => format!(". Resets at {}", at),
        None => String::new(),
    }
}

/// Extract a short error message suitable for display.
///
/// Takes the first line of an error message, which is useful for errors
/// that include multi-line details.
#[inline]
pub fn short_error_message(e: &impl std::error::Error) -> String {
    let full = e.to_string();
    full.lines().next().unwrap_or(&full).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_display_includes_reset_when_known() {
        let at = DateTime::parse_from_rfc3339("2026-08-01T12:00:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc);
        let err = FetchError::RateLimited {
            remaining: Some(0),
            reset_at: Some(at),
        };
        assert!(err.to_string().contains("Resets at"));

        let bare = FetchError::RateLimited {
            remaining: None,
            reset_at: None,
        };
        assert_eq!(bare.to_string(), "Rate limit exceeded");
    }

    #[test]
    fn classification_helpers() {
        assert!(FetchError::StatPending.is_still_computing());
        assert!(!FetchError::Unauthorized.is_still_computing());
        assert!(
            FetchError::RateLimited {
                remaining: None,
                reset_at: None
            }
            .is_rate_limited()
        );
    }

    #[test]
    fn short_error_message_takes_first_line() {
        let err = std::io::Error::other("first line\nsecond line");
        assert_eq!(short_error_message(&err), "first line");
    }
}
