//! Boundary error payload served to the UI/API layer.

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::github::FetchError;
use crate::store::StoreError;

/// Machine-readable error codes in outbound error payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    RateLimit,
    NotFound,
    Unauthorized,
    Forbidden,
    ServerError,
    NetworkError,
    InvalidRange,
    InvalidParams,
    InvalidRepos,
    InvalidSha,
    ServiceUnavailable,
}

/// Error payload shape: `{message, code, retryAfter?}`.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub code: ErrorCode,
    /// Seconds until a rate-limited caller may retry, when known.
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            retry_after: None,
        }
    }

    pub fn invalid_range(value: &str) -> Self {
        Self::new(
            ErrorCode::InvalidRange,
            format!("Unknown time range: {value:?}"),
        )
    }

    pub fn invalid_repos(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRepos, message)
    }

    pub fn invalid_sha(value: &str) -> Self {
        Self::new(ErrorCode::InvalidSha, format!("Invalid commit SHA: {value:?}"))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn forbidden(owner: &str, name: &str) -> Self {
        Self::new(
            ErrorCode::Forbidden,
            format!("Repository not allow-listed: {owner}/{name}"),
        )
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Forbidden { owner, name } => Self::forbidden(&owner, &name),
            FetchError::Unauthorized => Self::new(ErrorCode::Unauthorized, err.to_string()),
            FetchError::NotFound(_) => Self::new(ErrorCode::NotFound, err.to_string()),
            FetchError::RateLimited { reset_at, .. } => {
                let retry_after = reset_at
                    .map(|at| (at - Utc::now()).num_seconds().max(0) as u64);
                Self {
                    message: err.to_string(),
                    code: ErrorCode::RateLimit,
                    retry_after,
                }
            }
            FetchError::StatPending | FetchError::ServiceUnavailable { .. } => {
                Self::new(ErrorCode::ServiceUnavailable, err.to_string())
            }
            FetchError::Server { .. } | FetchError::Decode(_) => {
                Self::new(ErrorCode::ServerError, err.to_string())
            }
            FetchError::Network(_) => Self::new(ErrorCode::NetworkError, err.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::new(ErrorCode::ServerError, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn serializes_with_camel_case_retry_after() {
        let err = ApiError {
            message: "Rate limit exceeded".to_string(),
            code: ErrorCode::RateLimit,
            retry_after: Some(120),
        };
        let value = serde_json::to_value(&err).expect("serialize");
        assert_eq!(value["code"], "RateLimit");
        assert_eq!(value["retryAfter"], 120);

        let bare = ApiError::new(ErrorCode::NotFound, "missing");
        let value = serde_json::to_value(&bare).expect("serialize");
        assert!(value.get("retryAfter").is_none());
    }

    #[test]
    fn rate_limited_fetch_error_carries_retry_after() {
        let err: ApiError = FetchError::RateLimited {
            remaining: Some(0),
            reset_at: Some(Utc::now() + Duration::minutes(10)),
        }
        .into();

        assert_eq!(err.code, ErrorCode::RateLimit);
        let retry_after = err.retry_after.expect("retry_after should be set");
        assert!(retry_after > 0 && retry_after <= 600);
    }

    #[test]
    fn fetch_error_codes_map_per_taxonomy() {
        let cases: Vec<(FetchError, ErrorCode)> = vec![
            (
                FetchError::Forbidden {
                    owner: "a".into(),
                    name: "b".into(),
                },
                ErrorCode::Forbidden,
            ),
            (FetchError::Unauthorized, ErrorCode::Unauthorized),
            (FetchError::NotFound("x".into()), ErrorCode::NotFound),
            (
                FetchError::ServiceUnavailable { attempts: 7 },
                ErrorCode::ServiceUnavailable,
            ),
            (FetchError::Server { status: 502 }, ErrorCode::ServerError),
            (FetchError::Network("reset".into()), ErrorCode::NetworkError),
        ];

        for (fetch_err, expected) in cases {
            let api_err: ApiError = fetch_err.into();
            assert_eq!(api_err.code, expected);
        }
    }
}
