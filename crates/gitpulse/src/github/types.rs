//! Wire types deserialized from the commit API.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One page of commit summaries from the paginated list endpoint.
#[derive(Debug, Clone)]
pub struct CommitPage {
    pub items: Vec<CommitSummary>,
    /// True when the page was full, meaning another page may exist.
    pub has_more: bool,
}

/// A commit as it appears in the list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
    pub commit: CommitInfo,
    /// Platform account of the author, absent when the email maps to no account.
    pub author: Option<AccountInfo>,
    #[serde(default)]
    pub parents: Vec<ParentRef>,
}

impl CommitSummary {
    /// First line of the commit message.
    pub fn message_title(&self) -> String {
        crate::entity::commit::message_title(&self.commit.message)
    }

    /// Derived short SHA prefix.
    pub fn short_sha(&self) -> String {
        crate::entity::commit::short_sha(&self.sha)
    }

    /// A commit with more than one parent is a merge commit.
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// Git-level commit information nested in a summary.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitInfo {
    pub message: String,
    pub author: GitIdentity,
}

/// Git author identity (name/email/date from the commit object).
#[derive(Debug, Clone, Deserialize)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
    pub date: DateTime<Utc>,
}

/// Platform account attached to a commit or contributor entry.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    pub login: String,
    pub avatar_url: Option<String>,
}

/// Parent reference in a commit summary.
#[derive(Debug, Clone, Deserialize)]
pub struct ParentRef {
    pub sha: String,
}

/// Full per-commit stats from the detail endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub sha: String,
    pub stats: CommitStats,
    #[serde(default)]
    pub files: Vec<FileChange>,
    #[serde(default)]
    pub parents: Vec<ParentRef>,
}

/// Aggregate line stats of a single commit.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CommitStats {
    pub additions: i32,
    pub deletions: i32,
    pub total: i32,
}

/// Per-file change entry in a commit detail.
#[derive(Debug, Clone, Deserialize)]
pub struct FileChange {
    pub filename: String,
    #[serde(default)]
    pub additions: i32,
    #[serde(default)]
    pub deletions: i32,
}

/// Repository metadata endpoint payload (the fields the dashboard uses).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoMetadata {
    pub full_name: String,
    pub description: Option<String>,
    /// Size in KB.
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub stargazers_count: i64,
    #[serde(default)]
    pub forks_count: i64,
    pub language: Option<String>,
    pub pushed_at: Option<DateTime<Utc>>,
}

/// One contributor from the contributors endpoint.
///
/// Also serializable: the facade caches these payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributorInfo {
    pub login: String,
    pub avatar_url: Option<String>,
    pub contributions: i64,
}

/// Language byte counts keyed by language name.
pub type LanguageBreakdown = BTreeMap<String, i64>;

/// One week of the commit-activity aggregate stat.
///
/// `week` is the epoch second of the week start; `days` holds seven
/// per-weekday counts starting on Sunday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitActivityWeek {
    pub week: i64,
    pub total: i64,
    #[serde(default)]
    pub days: Vec<i64>,
}
