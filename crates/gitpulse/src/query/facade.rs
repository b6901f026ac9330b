//! The query facade: read operations over store + cache, falling back to the
//! remote fetcher only when the store has nothing to say.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::allowlist::{self, TrackedRepo};
use crate::cache::{ttl, CacheStore};
use crate::entity::cache_entry::Model as CacheEntryModel;
use crate::entity::commit::Model as CommitModel;
use crate::github::{
    CommitActivityWeek, CommitClient, LanguageBreakdown, RepoMetadata, StatEndpoint,
};
use crate::store;
use crate::timeline::{self, SeriesRepo, TimeRange, TimelineBundle};

use super::error::ApiError;
use super::validate;

/// Maximum contributors returned per request.
const CONTRIBUTOR_LIMIT: u64 = 50;

/// Authors included in the stats summary.
const TOP_AUTHOR_LIMIT: u64 = 5;

/// Repository identity attached to query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub owner: String,
    pub name: String,
    pub display_name: String,
}

impl RepoSummary {
    fn from_tracked(tracked: &TrackedRepo) -> Self {
        Self {
            owner: tracked.owner.to_string(),
            name: tracked.name.to_string(),
            display_name: tracked.display_name.to_string(),
        }
    }
}

/// One commit in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitView {
    pub sha: String,
    pub short_sha: String,
    pub message_title: String,
    pub author: String,
    pub author_login: Option<String>,
    pub author_avatar: Option<String>,
    pub committed_at: DateTime<Utc>,
    pub additions: i32,
    pub deletions: i32,
    pub files_changed: i32,
    pub is_merge_commit: bool,
}

impl CommitView {
    fn from_model(model: &CommitModel) -> Self {
        Self {
            sha: model.sha.clone(),
            short_sha: model.short_sha.clone(),
            message_title: model.message_title.clone(),
            author: model.author.clone(),
            author_login: model.author_login.clone(),
            author_avatar: model.author_avatar.clone(),
            committed_at: model.committed_at.with_timezone(&Utc),
            additions: model.additions,
            deletions: model.deletions,
            files_changed: model.files_changed,
            is_merge_commit: model.is_merge_commit,
        }
    }
}

/// Commits of a single repository in a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoCommits {
    pub repository: RepoSummary,
    pub commits: Vec<CommitView>,
}

/// One entry of the flattened combined list, tagged with the repository's
/// display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedCommit {
    pub repository: String,
    #[serde(flatten)]
    pub commit: CommitView,
}

/// Result of the commit listing operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitsResponse {
    pub range: TimeRange,
    pub repositories: Vec<RepoCommits>,
    pub combined: Vec<TaggedCommit>,
}

/// Repository-joined single commit lookup result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDetailResponse {
    pub repository: RepoSummary,
    /// Full commit message, not just the title.
    pub message: String,
    pub author_email: String,
    #[serde(flatten)]
    pub commit: CommitView,
}

/// Where contributor data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatSource {
    /// Computed from persisted commits in the requested window.
    Store,
    /// Remote contributors endpoint (all-time), used when the store has no
    /// rows yet.
    Remote,
}

/// One contributor entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorEntry {
    pub name: String,
    pub commits: i64,
    /// Only available for store-sourced entries.
    pub additions: Option<i64>,
    pub deletions: Option<i64>,
    /// Only available for remote-sourced entries.
    pub avatar_url: Option<String>,
}

/// Result of the contributor ranking operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributorsResponse {
    pub range: TimeRange,
    pub source: StatSource,
    pub contributors: Vec<ContributorEntry>,
}

/// Scalar aggregates over the date-filtered commit set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub range: TimeRange,
    pub total_commits: u64,
    pub additions: i64,
    pub deletions: i64,
    pub top_authors: Vec<ContributorEntry>,
}

/// Serves read operations by combining cache, store, and (on cold cache or
/// empty store) the remote fetcher.
///
/// Dependencies are explicit and injected; the facade holds no mutable state,
/// so one instance can serve any number of concurrent requests. It answers
/// from store and cache even while the remote API is failing, as long as
/// prior sync data exists.
pub struct QueryFacade {
    db: Arc<DatabaseConnection>,
    cache: CacheStore,
    client: CommitClient,
}

impl QueryFacade {
    pub fn new(db: Arc<DatabaseConnection>, cache: CacheStore, client: CommitClient) -> Self {
        Self { db, cache, client }
    }

    /// Gap-free per-repository and combined timelines for the window.
    pub async fn timeline(
        &self,
        repos: Option<&str>,
        range: &str,
        locale: &str,
    ) -> Result<TimelineBundle, ApiError> {
        let range = validate::parse_range(range)?;
        let tracked = validate::parse_repos(repos)?;

        let key = CacheEntryModel::timeline_key(&repos_token(&tracked), range.as_str(), locale);
        self.cache
            .with_cache(&key, ttl::for_range(range), || async {
                let series_repos = self.resolve_series_repos(&tracked).await?;
                timeline::timeline(&self.db, &series_repos, range, locale)
                    .await
                    .map_err(ApiError::from)
            })
            .await
    }

    /// Commits grouped by repository plus a flattened, display-name-tagged
    /// combined list, newest first. An optional search restricts to commits
    /// whose SHA or short SHA starts with the lower-cased query.
    pub async fn commits(
        &self,
        repos: Option<&str>,
        range: &str,
        search: Option<&str>,
    ) -> Result<CommitsResponse, ApiError> {
        let range = validate::parse_range(range)?;
        let tracked = validate::parse_repos(repos)?;
        let search = search.map(validate::parse_search).transpose()?;

        let key = CacheEntryModel::commits_key(
            &repos_token(&tracked),
            range.as_str(),
            search.as_deref(),
        );
        self.cache
            .with_cache(&key, ttl::for_range(range), || async {
                let rows = store::repos::find_tracked(&self.db, &tracked)
                    .await
                    .map_err(ApiError::from)?;
                let by_id: HashMap<Uuid, &TrackedRepo> = rows
                    .iter()
                    .filter_map(|r| {
                        allowlist::find(&r.owner, &r.name).map(|tracked| (r.id, tracked))
                    })
                    .collect();
                let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

                let since = timeline::start_date(range);
                let commits =
                    store::commits::find_in_range(&self.db, &ids, since, search.as_deref())
                        .await
                        .map_err(ApiError::from)?;

                let mut grouped: HashMap<Uuid, Vec<CommitView>> = HashMap::new();
                let mut combined = Vec::with_capacity(commits.len());
                for commit in &commits {
                    let view = CommitView::from_model(commit);
                    if let Some(tracked) = by_id.get(&commit.repository_id) {
                        combined.push(TaggedCommit {
                            repository: tracked.display_name.to_string(),
                            commit: view.clone(),
                        });
                    }
                    grouped.entry(commit.repository_id).or_default().push(view);
                }

                let repositories = tracked
                    .iter()
                    .map(|t| {
                        let commits = rows
                            .iter()
                            .find(|r| r.owner == t.owner && r.name == t.name)
                            .and_then(|r| grouped.remove(&r.id))
                            .unwrap_or_default();
                        RepoCommits {
                            repository: RepoSummary::from_tracked(t),
                            commits,
                        }
                    })
                    .collect();

                Ok(CommitsResponse {
                    range,
                    repositories,
                    combined,
                })
            })
            .await
    }

    /// Repository-joined single commit lookup.
    ///
    /// Returns `Ok(None)` when the commit (or the repository row) is unknown,
    /// letting the caller decide whether to fall back to a live fetch.
    pub async fn commit_detail(
        &self,
        owner: &str,
        name: &str,
        sha: &str,
    ) -> Result<Option<CommitDetailResponse>, ApiError> {
        let tracked =
            allowlist::find(owner, name).ok_or_else(|| ApiError::forbidden(owner, name))?;
        let sha = validate::parse_sha(sha)?;

        // Commit detail is immutable, so hits can live a long time. A miss is
        // not cached: the commit may arrive with the next sync or webhook.
        let key = CacheEntryModel::commit_detail_key(owner, name, &sha);
        if let Some(hit) = self.cache.get::<CommitDetailResponse>(&key).await {
            return Ok(Some(hit));
        }

        let Some(repo) = store::repos::find_by_owner_name(&self.db, owner, name).await? else {
            return Ok(None);
        };
        let Some(commit) = store::commits::find_by_sha(&self.db, repo.id, &sha).await? else {
            return Ok(None);
        };

        let response = CommitDetailResponse {
            repository: RepoSummary::from_tracked(tracked),
            message: commit.message.clone(),
            author_email: commit.author_email.clone(),
            commit: CommitView::from_model(&commit),
        };
        self.cache.set(&key, &response, ttl::COMMIT_DETAIL).await;
        Ok(Some(response))
    }

    /// Contributor ranking over the window, falling back to the remote
    /// contributors endpoint (through the cache) when the store has no rows.
    pub async fn contributors(
        &self,
        repos: Option<&str>,
        range: &str,
    ) -> Result<ContributorsResponse, ApiError> {
        let range = validate::parse_range(range)?;
        let tracked = validate::parse_repos(repos)?;

        let rows = store::repos::find_tracked(&self.db, &tracked).await?;
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let since = timeline::start_date(range);

        let total = store::commits::count_in_range(&self.db, &ids, since).await?;
        if total > 0 {
            let authors =
                store::commits::count_by_author(&self.db, &ids, since, CONTRIBUTOR_LIMIT).await?;
            return Ok(ContributorsResponse {
                range,
                source: StatSource::Store,
                contributors: authors
                    .into_iter()
                    .map(|a| ContributorEntry {
                        name: a.author,
                        commits: a.commits,
                        additions: Some(a.additions),
                        deletions: Some(a.deletions),
                        avatar_url: None,
                    })
                    .collect(),
            });
        }

        // Cold store: merge the remote (all-time) contributor rankings.
        let mut merged: HashMap<String, ContributorEntry> = HashMap::new();
        for repo in &tracked {
            let key = CacheEntryModel::contributors_key(repo.owner, repo.name);
            let remote = self
                .cache
                .with_cache(&key, ttl::REMOTE_STATS, || async {
                    self.client
                        .contributors(repo.owner, repo.name)
                        .await
                        .map_err(ApiError::from)
                })
                .await?;

            for contributor in remote {
                let entry = merged
                    .entry(contributor.login.clone())
                    .or_insert_with(|| ContributorEntry {
                        name: contributor.login.clone(),
                        commits: 0,
                        additions: None,
                        deletions: None,
                        avatar_url: contributor.avatar_url.clone(),
                    });
                entry.commits += contributor.contributions;
            }
        }

        let mut contributors: Vec<ContributorEntry> = merged.into_values().collect();
        contributors.sort_by(|a, b| b.commits.cmp(&a.commits).then(a.name.cmp(&b.name)));
        contributors.truncate(CONTRIBUTOR_LIMIT as usize);

        Ok(ContributorsResponse {
            range,
            source: StatSource::Remote,
            contributors,
        })
    }

    /// Scalar aggregates (total commits, line sums, top authors) over the
    /// same date-filtered commit set the other operations use.
    pub async fn stats(
        &self,
        repos: Option<&str>,
        range: &str,
    ) -> Result<StatsResponse, ApiError> {
        let range = validate::parse_range(range)?;
        let tracked = validate::parse_repos(repos)?;

        let key = CacheEntryModel::stats_key(&repos_token(&tracked), range.as_str());
        self.cache
            .with_cache(&key, ttl::for_range(range), || async {
                let rows = store::repos::find_tracked(&self.db, &tracked)
                    .await
                    .map_err(ApiError::from)?;
                let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
                let since = timeline::start_date(range);

                let total_commits = store::commits::count_in_range(&self.db, &ids, since)
                    .await
                    .map_err(ApiError::from)?;
                let totals = store::commits::sum_line_changes(&self.db, &ids, since)
                    .await
                    .map_err(ApiError::from)?;
                let authors =
                    store::commits::count_by_author(&self.db, &ids, since, TOP_AUTHOR_LIMIT)
                        .await
                        .map_err(ApiError::from)?;

                Ok(StatsResponse {
                    range,
                    total_commits,
                    additions: totals.additions,
                    deletions: totals.deletions,
                    top_authors: authors
                        .into_iter()
                        .map(|a| ContributorEntry {
                            name: a.author,
                            commits: a.commits,
                            additions: Some(a.additions),
                            deletions: Some(a.deletions),
                            avatar_url: None,
                        })
                        .collect(),
                })
            })
            .await
    }

    /// Repository metadata (size, stars, primary language), fetched remotely
    /// through the cache.
    pub async fn repo_overview(&self, owner: &str, name: &str) -> Result<RepoMetadata, ApiError> {
        if !allowlist::is_allowed(owner, name) {
            return Err(ApiError::forbidden(owner, name));
        }

        let key = CacheEntryModel::overview_key(owner, name);
        self.cache
            .with_cache(&key, ttl::REMOTE_STATS, || async {
                self.client
                    .repo_metadata(owner, name)
                    .await
                    .map_err(ApiError::from)
            })
            .await
    }

    /// Weekly commit-activity aggregate, computed asynchronously upstream and
    /// polled with bounded backoff.
    ///
    /// This blocks the calling request for the duration of the polling loop;
    /// callers should apply a request-level timeout and treat
    /// `ServiceUnavailable` as retryable.
    pub async fn commit_activity(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Vec<CommitActivityWeek>, ApiError> {
        if !allowlist::is_allowed(owner, name) {
            return Err(ApiError::forbidden(owner, name));
        }

        let key = CacheEntryModel::activity_key(owner, name);
        self.cache
            .with_cache(&key, ttl::REMOTE_STATS, || async {
                self.client
                    .aggregate_stat(owner, name, StatEndpoint::CommitActivity)
                    .await
                    .map_err(ApiError::from)
            })
            .await
    }

    /// Language byte breakdown, fetched remotely through the cache.
    pub async fn languages(&self, owner: &str, name: &str) -> Result<LanguageBreakdown, ApiError> {
        if !allowlist::is_allowed(owner, name) {
            return Err(ApiError::forbidden(owner, name));
        }

        let key = CacheEntryModel::languages_key(owner, name);
        self.cache
            .with_cache(&key, ttl::REMOTE_STATS, || async {
                self.client
                    .languages(owner, name)
                    .await
                    .map_err(ApiError::from)
            })
            .await
    }

    async fn resolve_series_repos(
        &self,
        tracked: &[&'static TrackedRepo],
    ) -> Result<Vec<SeriesRepo>, ApiError> {
        let rows = store::repos::find_tracked(&self.db, tracked).await?;
        let by_key: HashMap<(&str, &str), Uuid> = rows
            .iter()
            .map(|r| ((r.owner.as_str(), r.name.as_str()), r.id))
            .collect();

        Ok(tracked
            .iter()
            .map(|t| SeriesRepo {
                id: by_key.get(&(t.owner, t.name)).copied(),
                owner: t.owner.to_string(),
                name: t.name.to_string(),
                display_name: t.display_name.to_string(),
            })
            .collect())
    }
}

/// Stable cache-key token for a repository set.
fn repos_token(repos: &[&TrackedRepo]) -> String {
    let mut names: Vec<String> = repos.iter().map(|r| r.full_name()).collect();
    names.sort();
    names.join("+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repos_token_is_order_independent() {
        let all = allowlist::all();
        let forward: Vec<&TrackedRepo> = all.iter().collect();
        let reverse: Vec<&TrackedRepo> = all.iter().rev().collect();
        assert_eq!(repos_token(&forward), repos_token(&reverse));
    }

    #[test]
    fn tagged_commit_flattens_fields() {
        let view = CommitView {
            sha: "ab12cd34".to_string(),
            short_sha: "ab12cd3".to_string(),
            message_title: "fix".to_string(),
            author: "Ada".to_string(),
            author_login: None,
            author_avatar: None,
            committed_at: Utc::now(),
            additions: 1,
            deletions: 0,
            files_changed: 1,
            is_merge_commit: false,
        };
        let tagged = TaggedCommit {
            repository: "GitPulse Core".to_string(),
            commit: view,
        };

        let value = serde_json::to_value(&tagged).expect("serialize");
        assert_eq!(value["repository"], "GitPulse Core");
        assert_eq!(value["sha"], "ab12cd34");
        assert_eq!(value["message_title"], "fix");
    }
}
