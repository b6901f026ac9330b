//! Commit API client: paginated lists, per-commit detail, asynchronous
//! aggregate-stat polling, repository metadata.

use std::sync::Arc;
use std::time::Duration;

use backon::Retryable;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;

use crate::allowlist;
use crate::http::{header_get, HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::rate_limit::ApiRateLimiter;
use crate::retry::{stat_poll_backoff, STAT_POLL_MAX_ATTEMPTS};

use super::error::FetchError;
use super::types::{
    CommitDetail, CommitPage, CommitSummary, ContributorInfo, LanguageBreakdown, RepoMetadata,
};

/// Default base URL of the commit API.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default page size for commit list fetches.
pub const DEFAULT_PER_PAGE: u32 = 100;

/// Request timeout for the real transport.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Asynchronous aggregate-stat endpoints computed upstream.
///
/// These may answer HTTP 202 ("computing") and are polled with bounded
/// backoff by [`CommitClient::aggregate_stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatEndpoint {
    /// Weekly commit counts for the last year.
    CommitActivity,
    /// Weekly additions/deletions for the repository's lifetime.
    CodeFrequency,
    /// Owner vs. everyone weekly commit counts.
    Participation,
}

impl StatEndpoint {
    fn route(self, owner: &str, name: &str) -> String {
        let segment = match self {
            StatEndpoint::CommitActivity => "commit_activity",
            StatEndpoint::CodeFrequency => "code_frequency",
            StatEndpoint::Participation => "participation",
        };
        format!("/repos/{}/{}/stats/{}", owner, name, segment)
    }
}

/// Authenticated client for the commit API.
///
/// All I/O goes through the [`HttpTransport`] seam; tests inject an in-memory
/// mock. An optional [`ApiRateLimiter`] is waited on before every request.
#[derive(Clone)]
pub struct CommitClient {
    transport: Arc<dyn HttpTransport>,
    base_url: Arc<String>,
    token: Arc<String>,
    rate_limiter: Option<ApiRateLimiter>,
}

impl CommitClient {
    /// Create a client against the real API.
    pub fn new(token: &str, rate_limiter: Option<ApiRateLimiter>) -> Result<Self, FetchError> {
        let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self::with_transport(
            DEFAULT_API_BASE,
            token,
            Arc::new(transport),
            rate_limiter,
        ))
    }

    /// Create a client over an arbitrary transport and base URL.
    ///
    /// This is the seam tests use to run against [`crate::http::MockTransport`].
    pub fn with_transport(
        base_url: &str,
        token: &str,
        transport: Arc<dyn HttpTransport>,
        rate_limiter: Option<ApiRateLimiter>,
    ) -> Self {
        Self {
            transport,
            base_url: Arc::new(base_url.trim_end_matches('/').to_string()),
            token: Arc::new(token.to_string()),
            rate_limiter,
        }
    }

    /// Wait for the rate limiter if one is configured.
    async fn wait_for_rate_limit(&self) {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }
    }

    /// Make a GET request and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, route: &str) -> Result<T, FetchError> {
        self.wait_for_rate_limit().await;

        let request = HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}{}", self.base_url, route),
            headers: vec![
                (
                    "Accept".to_string(),
                    "application/vnd.github+json".to_string(),
                ),
                ("User-Agent".to_string(), "gitpulse".to_string()),
                (
                    "Authorization".to_string(),
                    format!("Bearer {}", self.token.as_str()),
                ),
            ],
        };

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        classify_status(&response, route)?;

        serde_json::from_slice(&response.body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    /// Fetch one page of the commit list.
    ///
    /// Fails with `Forbidden` before any I/O when the repository is not
    /// allow-listed. `has_more` is true when the page came back full;
    /// pagination stops on the first short page.
    pub async fn list_commits(
        &self,
        owner: &str,
        name: &str,
        page: u32,
        per_page: u32,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<CommitPage, FetchError> {
        require_allowed(owner, name)?;

        let mut route = format!(
            "/repos/{}/{}/commits?per_page={}&page={}",
            owner, name, per_page, page
        );
        if let Some(since) = since {
            route.push_str(&format!(
                "&since={}",
                since.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }
        if let Some(until) = until {
            route.push_str(&format!(
                "&until={}",
                until.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }

        let items: Vec<CommitSummary> = self.get_json(&route).await?;
        let has_more = items.len() as u32 == per_page;

        Ok(CommitPage { items, has_more })
    }

    /// Fetch full stats for a single commit.
    pub async fn commit_detail(
        &self,
        owner: &str,
        name: &str,
        sha: &str,
    ) -> Result<CommitDetail, FetchError> {
        require_allowed(owner, name)?;

        let route = format!("/repos/{}/{}/commits/{}", owner, name, sha);
        self.get_json(&route).await
    }

    /// Fetch an asynchronously-computed aggregate stat, polling while the
    /// upstream answers 202.
    ///
    /// The polling loop is a bounded retry-with-backoff state machine:
    /// `pending → ready` on a 200, `pending → pending` with a longer delay on
    /// another 202, `pending → exhausted` once the attempt budget is spent,
    /// which surfaces as `ServiceUnavailable`.
    pub async fn aggregate_stat<T: DeserializeOwned>(
        &self,
        owner: &str,
        name: &str,
        endpoint: StatEndpoint,
    ) -> Result<T, FetchError> {
        require_allowed(owner, name)?;

        let route = endpoint.route(owner, name);

        let result = (|| async { self.get_json::<T>(&route).await })
            .retry(stat_poll_backoff())
            .when(FetchError::is_still_computing)
            .notify(|_, dur| {
                tracing::debug!(
                    route = %route,
                    delay_ms = dur.as_millis() as u64,
                    "aggregate stat still computing, backing off"
                );
            })
            .await;

        match result {
            Err(FetchError::StatPending) => Err(FetchError::ServiceUnavailable {
                attempts: STAT_POLL_MAX_ATTEMPTS + 1,
            }),
            other => other,
        }
    }

    /// Fetch repository metadata.
    pub async fn repo_metadata(&self, owner: &str, name: &str) -> Result<RepoMetadata, FetchError> {
        require_allowed(owner, name)?;
        self.get_json(&format!("/repos/{}/{}", owner, name)).await
    }

    /// Fetch the language byte breakdown.
    pub async fn languages(&self, owner: &str, name: &str) -> Result<LanguageBreakdown, FetchError> {
        require_allowed(owner, name)?;
        self.get_json(&format!("/repos/{}/{}/languages", owner, name))
            .await
    }

    /// Fetch the contributor ranking.
    pub async fn contributors(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Vec<ContributorInfo>, FetchError> {
        require_allowed(owner, name)?;
        self.get_json(&format!("/repos/{}/{}/contributors", owner, name))
            .await
    }
}

fn require_allowed(owner: &str, name: &str) -> Result<(), FetchError> {
    if allowlist::is_allowed(owner, name) {
        Ok(())
    } else {
        Err(FetchError::Forbidden {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

/// Map a non-200 response to the error taxonomy.
///
/// Rate-limit state is read from the `x-ratelimit-*` headers; a 403 with
/// exhausted quota (or a 429) is `RateLimited`, any other 403 is treated as
/// an auth problem since allow-list checks never reach the network.
fn classify_status(response: &HttpResponse, route: &str) -> Result<(), FetchError> {
    match response.status {
        200 => Ok(()),
        202 => Err(FetchError::StatPending),
        401 => Err(FetchError::Unauthorized),
        403 | 429 => {
            let (remaining, reset_at) = parse_rate_limit_headers(response);
            if response.status == 429 || remaining == Some(0) {
                Err(FetchError::RateLimited {
                    remaining,
                    reset_at,
                })
            } else {
                Err(FetchError::Unauthorized)
            }
        }
        404 => Err(FetchError::NotFound(route.to_string())),
        status => Err(FetchError::Server { status }),
    }
}

/// Extract rate limit state from response headers, when the transport
/// exposes it.
fn parse_rate_limit_headers(
    response: &HttpResponse,
) -> (Option<u32>, Option<DateTime<Utc>>) {
    let remaining = header_get(&response.headers, "x-ratelimit-remaining")
        .and_then(|v| v.parse::<u32>().ok());
    let reset_at = header_get(&response.headers, "x-ratelimit-reset")
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|epoch| DateTime::from_timestamp(epoch, 0));
    (remaining, reset_at)
}
