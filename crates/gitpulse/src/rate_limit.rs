//! Proactive API rate limiting.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Default requests per second against the commit API.
///
/// The upstream allows 5000 requests/hour (~1.4/sec); 10/sec leaves room for
/// bursts while the inter-page and inter-batch pacing keeps sustained load low.
pub const DEFAULT_RPS: u32 = 10;

/// A standalone API rate limiter using the governor crate.
///
/// # Example
///
/// ```ignore
/// use gitpulse::ApiRateLimiter;
///
/// let limiter = ApiRateLimiter::new(10); // 10 requests per second
///
/// // Before each API call:
/// limiter.wait().await;
/// client.some_api_call().await?;
/// ```
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
}

impl ApiRateLimiter {
    /// Create a new rate limiter with the specified requests per second.
    ///
    /// # Arguments
    ///
    /// * `requests_per_second` - Maximum requests per second (must be > 0, defaults to 1 if 0)
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rps));

        Self {
            inner: Arc::new(rate_limiter),
        }
    }

    /// Wait until a request is allowed by the rate limiter.
    ///
    /// This method will block (asynchronously) until the rate limit allows
    /// another request to proceed.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_request_passes_immediately() {
        let limiter = ApiRateLimiter::new(DEFAULT_RPS);
        // Should not block on the first permit.
        limiter.wait().await;
    }

    #[tokio::test]
    async fn zero_rps_falls_back_to_one() {
        let limiter = ApiRateLimiter::new(0);
        limiter.wait().await;
    }
}
