//! Shared sync types and constants.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::github::FetchError;
use crate::store::StoreError;

/// Commits per list page.
pub const PAGE_SIZE: u32 = 100;

/// Commits per detail-fetch-and-persist batch.
pub const DETAIL_BATCH_SIZE: usize = 50;

/// Concurrent detail fetches within one batch.
/// Kept low to respect upstream secondary rate limits.
pub const DETAIL_CONCURRENCY: usize = 5;

/// Pause between sequential list pages.
pub const INTER_PAGE_DELAY: std::time::Duration = std::time::Duration::from_millis(250);

/// Pause between sequential detail batches.
pub const INTER_BATCH_DELAY: std::time::Duration = std::time::Duration::from_millis(500);

/// Pause between repositories in a full sweep.
pub const INTER_REPO_DELAY: std::time::Duration = std::time::Duration::from_secs(2);

/// Errors that can occur during a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Upstream API failure.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A spawned detail-fetch task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

/// Result of syncing a single repository.
#[derive(Debug, Clone)]
pub struct RepoSyncReport {
    pub owner: String,
    pub name: String,
    /// Rows actually inserted (duplicates skipped by the store don't count).
    pub commits_added: usize,
    /// Rows whose author login was backfilled.
    pub backfilled: u64,
    /// List pages fetched.
    pub pages_fetched: u32,
    /// Commit summaries seen across all pages.
    pub total_listed: usize,
}

/// Per-repository entry in a full-sweep summary.
///
/// A failure in one repository is recorded here and never aborts the others.
#[derive(Debug, Clone)]
pub struct RepoSyncSummary {
    /// Full name (owner/name).
    pub repo: String,
    pub success: bool,
    pub commits_added: usize,
    pub error: Option<String>,
}

/// Commit payload delivered by the webhook-insert path.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookCommit {
    pub sha: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub committed_at: DateTime<Utc>,
    pub author_login: Option<String>,
    pub author_avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_commit_parses_minimal_payload() {
        let payload: WebhookCommit = serde_json::from_value(serde_json::json!({
            "sha": "ab12cd34ef56ab12cd34ef56ab12cd34ef56ab12",
            "message": "fix: webhook insert",
            "author_name": "Ada",
            "author_email": "ada@example.com",
            "committed_at": "2026-08-01T09:00:00Z",
            "author_login": null,
            "author_avatar": null
        }))
        .expect("payload should parse");

        assert_eq!(payload.author_name, "Ada");
        assert!(payload.author_login.is_none());
    }

    #[test]
    fn sync_error_wraps_layer_errors_transparently() {
        let err: SyncError = FetchError::Unauthorized.into();
        assert_eq!(err.to_string(), "Authentication required");

        let err: SyncError = StoreError::invalid_input("bad").into();
        assert!(err.to_string().contains("bad"));
    }
}
