//! Ingestion orchestration: fetch → dedup → enrich → batch-persist →
//! backfill → audit-log.
//!
//! # Module Structure
//!
//! - [`types`] - `RepoSyncReport`, `RepoSyncSummary`, `WebhookCommit`,
//!   `SyncError`, pacing constants
//! - [`progress`] - Progress reporting: `SyncProgress`, `ProgressCallback`, `emit()`
//! - [`engine`] - `sync_repository()`, `sync_all_repositories()`,
//!   `add_commit_from_webhook()`
//!
//! Sync runs are triggered externally and executed to completion or failure;
//! the engine is the only writer to the persistent store.

pub mod engine;
mod progress;
mod types;

pub use engine::{add_commit_from_webhook, sync_all_repositories, sync_repository};
pub use progress::{emit, ProgressCallback, SyncProgress};
pub use types::{
    RepoSyncReport, RepoSyncSummary, SyncError, WebhookCommit, DETAIL_BATCH_SIZE,
    DETAIL_CONCURRENCY, INTER_BATCH_DELAY, INTER_PAGE_DELAY, INTER_REPO_DELAY, PAGE_SIZE,
};
