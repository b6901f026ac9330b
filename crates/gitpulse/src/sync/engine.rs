//! The sync engine: full-list ingestion, webhook inserts, and the
//! multi-repository sweep.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::allowlist;
use crate::cache::CacheStore;
use crate::entity::cache_entry::Model as CacheEntryModel;
use crate::entity::commit::ActiveModel as CommitActiveModel;
use crate::entity::sync_log::SyncType;
use crate::github::convert::to_commit_model;
use crate::github::types::{CommitDetail, CommitSummary};
use crate::github::{CommitClient, FetchError};
use crate::store;
use crate::store::commits::AuthorIdentity;

use super::progress::{emit, ProgressCallback, SyncProgress};
use super::types::{
    RepoSyncReport, RepoSyncSummary, SyncError, WebhookCommit, DETAIL_BATCH_SIZE,
    DETAIL_CONCURRENCY, INTER_BATCH_DELAY, INTER_PAGE_DELAY, INTER_REPO_DELAY, PAGE_SIZE,
};

/// Sync a single repository: fetch the entire commit list, insert the SHAs
/// not yet persisted, backfill author identities, and record the run in an
/// audit row.
///
/// The audit row is created before any other work and finalized exactly once
/// as `completed` or `failed`; a failure here never escapes past its own log
/// entry when driven from [`sync_all_repositories`]. On success, cached query
/// results for this repository (and all combined results) are invalidated.
#[tracing::instrument(skip(db, client, cache, display_name, on_progress), fields(owner = %owner, name = %name))]
pub async fn sync_repository(
    db: &DatabaseConnection,
    client: &CommitClient,
    cache: Option<&CacheStore>,
    owner: &str,
    name: &str,
    display_name: Option<&str>,
    on_progress: Option<&ProgressCallback>,
) -> Result<RepoSyncReport, SyncError> {
    // Audit row first, so even an early failure leaves a trace.
    let log = store::sync_logs::start(db, SyncType::Full, None).await?;

    match run_repository_sync(db, client, owner, name, display_name, on_progress).await {
        Ok((repo_id, report)) => {
            if let Err(e) = store::sync_logs::finish_completed(
                db,
                log.id,
                Some(repo_id),
                report.commits_added as i32,
            )
            .await
            {
                tracing::warn!(error = %e, "failed to finalize sync log");
            }

            if let Some(cache) = cache {
                cache
                    .invalidate_prefix(&CacheEntryModel::repo_prefix(owner, name))
                    .await;
                cache
                    .invalidate_prefix(&CacheEntryModel::combined_prefix())
                    .await;
            }

            emit(
                on_progress,
                SyncProgress::RepoSynced {
                    owner: owner.to_string(),
                    name: name.to_string(),
                    commits_added: report.commits_added,
                },
            );
            Ok(report)
        }
        Err(e) => {
            let message = e.to_string();
            if let Err(log_err) = store::sync_logs::finish_failed(db, log.id, None, &message).await
            {
                tracing::warn!(error = %log_err, "failed to finalize sync log");
            }

            emit(
                on_progress,
                SyncProgress::RepoSyncFailed {
                    owner: owner.to_string(),
                    name: name.to_string(),
                    error: message,
                },
            );
            Err(e)
        }
    }
}

async fn run_repository_sync(
    db: &DatabaseConnection,
    client: &CommitClient,
    owner: &str,
    name: &str,
    display_name: Option<&str>,
    on_progress: Option<&ProgressCallback>,
) -> Result<(Uuid, RepoSyncReport), SyncError> {
    // Allow-list gate before any write or fetch.
    let tracked = allowlist::find(owner, name).ok_or_else(|| FetchError::Forbidden {
        owner: owner.to_string(),
        name: name.to_string(),
    })?;
    let display = display_name.unwrap_or(tracked.display_name);

    let repo = store::repos::upsert(db, owner, name, display).await?;

    emit(
        on_progress,
        SyncProgress::FetchingCommits {
            owner: owner.to_string(),
            name: name.to_string(),
        },
    );

    // Sequential pages: the list is newest-first and the dedup step needs a
    // consistent snapshot before batching starts.
    let mut summaries: Vec<CommitSummary> = Vec::new();
    let mut page = 1u32;
    loop {
        let result = client
            .list_commits(owner, name, page, PAGE_SIZE, None, None)
            .await?;
        let count = result.items.len();
        summaries.extend(result.items);

        emit(
            on_progress,
            SyncProgress::FetchedPage {
                owner: owner.to_string(),
                name: name.to_string(),
                page,
                count,
                total_so_far: summaries.len(),
            },
        );

        if !result.has_more {
            break;
        }
        page += 1;
        tokio::time::sleep(INTER_PAGE_DELAY).await;
    }

    emit(
        on_progress,
        SyncProgress::FetchComplete {
            owner: owner.to_string(),
            name: name.to_string(),
            total: summaries.len(),
        },
    );

    // Author identities visible in this fetch, keyed by email. This is the
    // only source the backfill pass uses.
    let mut identities: HashMap<String, AuthorIdentity> = HashMap::new();
    for summary in &summaries {
        if let Some(account) = &summary.author {
            identities
                .entry(summary.commit.author.email.clone())
                .or_insert_with(|| AuthorIdentity {
                    login: account.login.clone(),
                    avatar: account.avatar_url.clone(),
                });
        }
    }

    let existing = store::commits::existing_shas(db, repo.id).await?;
    let total_listed = summaries.len();
    let new_commits: Vec<CommitSummary> = summaries
        .into_iter()
        .filter(|s| !existing.contains(&s.sha.to_lowercase()))
        .collect();

    emit(
        on_progress,
        SyncProgress::DedupComplete {
            owner: owner.to_string(),
            name: name.to_string(),
            new_count: new_commits.len(),
            known_count: total_listed - new_commits.len(),
        },
    );

    let batch_count = new_commits.len().div_ceil(DETAIL_BATCH_SIZE) as u32;
    let mut added = 0usize;
    for (i, chunk) in new_commits.chunks(DETAIL_BATCH_SIZE).enumerate() {
        if i > 0 {
            tokio::time::sleep(INTER_BATCH_DELAY).await;
        }

        emit(
            on_progress,
            SyncProgress::ProcessingBatch {
                owner: owner.to_string(),
                name: name.to_string(),
                batch: i as u32 + 1,
                batch_count,
                size: chunk.len(),
            },
        );

        let models = fetch_batch_details(client, repo.id, owner, name, chunk).await?;
        let inserted = store::commits::insert_many_skipping_duplicates(db, models).await?;
        added += inserted as usize;

        emit(
            on_progress,
            SyncProgress::PersistedBatch {
                owner: owner.to_string(),
                name: name.to_string(),
                inserted,
                total_added: added,
            },
        );
    }

    let backfilled = store::commits::backfill_author_identity(db, repo.id, &identities).await?;
    emit(
        on_progress,
        SyncProgress::BackfillComplete {
            owner: owner.to_string(),
            name: name.to_string(),
            updated: backfilled,
        },
    );

    store::repos::touch_last_sync(db, repo.id, Utc::now()).await?;

    Ok((
        repo.id,
        RepoSyncReport {
            owner: owner.to_string(),
            name: name.to_string(),
            commits_added: added,
            backfilled,
            pages_fetched: page,
            total_listed,
        },
    ))
}

/// Fetch per-commit detail for one batch with bounded parallelism and build
/// the rows to insert.
async fn fetch_batch_details(
    client: &CommitClient,
    repository_id: Uuid,
    owner: &str,
    name: &str,
    batch: &[CommitSummary],
) -> Result<Vec<CommitActiveModel>, SyncError> {
    let semaphore = Arc::new(Semaphore::new(DETAIL_CONCURRENCY));
    let mut handles = Vec::with_capacity(batch.len());

    for summary in batch {
        let client = client.clone();
        let semaphore = Arc::clone(&semaphore);
        let owner = owner.to_string();
        let name = name.to_string();
        let summary = summary.clone();

        handles.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|_| FetchError::Network("semaphore closed unexpectedly".to_string()))?;
            let detail = client.commit_detail(&owner, &name, &summary.sha).await?;
            Ok::<(CommitSummary, CommitDetail), FetchError>((summary, detail))
        }));
    }

    let mut models = Vec::with_capacity(batch.len());
    for handle in handles {
        let (summary, detail) = handle.await.map_err(|e| SyncError::Task(e.to_string()))??;
        models.push(to_commit_model(repository_id, &summary, &detail));
    }
    Ok(models)
}

/// Sync every allow-listed repository sequentially with an inter-repository
/// pause. One repository's failure is recorded in its summary entry and never
/// aborts the others.
#[tracing::instrument(skip_all, fields(repo_count = allowlist::all().len()))]
pub async fn sync_all_repositories(
    db: &DatabaseConnection,
    client: &CommitClient,
    cache: Option<&CacheStore>,
    on_progress: Option<&ProgressCallback>,
) -> Vec<RepoSyncSummary> {
    let mut summaries = Vec::with_capacity(allowlist::all().len());

    for (i, tracked) in allowlist::all().iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(INTER_REPO_DELAY).await;
        }

        let result = sync_repository(
            db,
            client,
            cache,
            tracked.owner,
            tracked.name,
            Some(tracked.display_name),
            on_progress,
        )
        .await;

        match result {
            Ok(report) => summaries.push(RepoSyncSummary {
                repo: tracked.full_name(),
                success: true,
                commits_added: report.commits_added,
                error: None,
            }),
            Err(e) => summaries.push(RepoSyncSummary {
                repo: tracked.full_name(),
                success: false,
                commits_added: 0,
                error: Some(e.to_string()),
            }),
        }
    }

    summaries
}

/// Idempotently insert a single commit delivered by a webhook.
///
/// Returns `Ok(false)` without side effects when the repository row does not
/// exist - the webhook path never implicitly creates one. A duplicate SHA is
/// a no-op thanks to the skip-duplicates insert.
#[tracing::instrument(skip(db, client, cache, payload), fields(owner = %owner, name = %name, sha = %payload.sha))]
pub async fn add_commit_from_webhook(
    db: &DatabaseConnection,
    client: &CommitClient,
    cache: Option<&CacheStore>,
    owner: &str,
    name: &str,
    payload: &WebhookCommit,
) -> Result<bool, SyncError> {
    let Some(repo) = store::repos::find_by_owner_name(db, owner, name).await? else {
        tracing::debug!("webhook for unknown repository ignored");
        return Ok(false);
    };

    let log = store::sync_logs::start(db, SyncType::Webhook, Some(repo.id)).await?;

    match insert_webhook_commit(db, client, repo.id, owner, name, payload).await {
        Ok(inserted) => {
            if let Err(e) =
                store::sync_logs::finish_completed(db, log.id, Some(repo.id), inserted as i32).await
            {
                tracing::warn!(error = %e, "failed to finalize sync log");
            }

            if inserted > 0 {
                if let Some(cache) = cache {
                    cache
                        .invalidate_prefix(&CacheEntryModel::repo_prefix(owner, name))
                        .await;
                    cache
                        .invalidate_prefix(&CacheEntryModel::combined_prefix())
                        .await;
                }
            }
            Ok(true)
        }
        Err(e) => {
            if let Err(log_err) =
                store::sync_logs::finish_failed(db, log.id, Some(repo.id), &e.to_string()).await
            {
                tracing::warn!(error = %log_err, "failed to finalize sync log");
            }
            Err(e)
        }
    }
}

async fn insert_webhook_commit(
    db: &DatabaseConnection,
    client: &CommitClient,
    repository_id: Uuid,
    owner: &str,
    name: &str,
    payload: &WebhookCommit,
) -> Result<u64, SyncError> {
    let sha = payload.sha.to_lowercase();

    // The webhook payload has no line stats; the detail endpoint does.
    let detail = client.commit_detail(owner, name, &sha).await?;
    let model = CommitActiveModel {
        id: Set(Uuid::new_v4()),
        repository_id: Set(repository_id),
        sha: Set(sha.clone()),
        short_sha: Set(crate::entity::commit::short_sha(&sha)),
        message: Set(payload.message.clone()),
        message_title: Set(crate::entity::commit::message_title(&payload.message)),
        author: Set(payload.author_name.clone()),
        author_email: Set(payload.author_email.clone()),
        author_login: Set(payload.author_login.clone()),
        author_avatar: Set(payload.author_avatar.clone()),
        committed_at: Set(payload.committed_at.fixed_offset()),
        additions: Set(detail.stats.additions),
        deletions: Set(detail.stats.deletions),
        files_changed: Set(detail.files.len() as i32),
        is_merge_commit: Set(detail.parents.len() > 1),
    };

    Ok(store::commits::insert_many_skipping_duplicates(db, vec![model]).await?)
}
