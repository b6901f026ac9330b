//! Progress reporting types for sync operations.

/// Progress events emitted during sync runs.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// Starting to fetch the commit list for a repository.
    FetchingCommits {
        owner: String,
        name: String,
    },

    /// Fetched a page of the commit list.
    FetchedPage {
        owner: String,
        name: String,
        /// Page number (1-indexed).
        page: u32,
        /// Number of commits on this page.
        count: usize,
        /// Running total of commits listed so far.
        total_so_far: usize,
    },

    /// Finished fetching the full commit list.
    FetchComplete {
        owner: String,
        name: String,
        total: usize,
    },

    /// Computed the set of SHAs not yet persisted.
    DedupComplete {
        owner: String,
        name: String,
        /// SHAs that need detail fetches and inserts.
        new_count: usize,
        /// SHAs already persisted and skipped.
        known_count: usize,
    },

    /// Starting detail fetches for one batch of new commits.
    ProcessingBatch {
        owner: String,
        name: String,
        /// Batch number (1-indexed).
        batch: u32,
        /// Total number of batches.
        batch_count: u32,
        /// Commits in this batch.
        size: usize,
    },

    /// Persisted one batch.
    PersistedBatch {
        owner: String,
        name: String,
        /// Rows actually inserted from this batch.
        inserted: u64,
        /// Running total of rows inserted this run.
        total_added: usize,
    },

    /// Finished the author identity backfill pass.
    BackfillComplete {
        owner: String,
        name: String,
        /// Rows whose login was filled.
        updated: u64,
    },

    /// A repository finished syncing.
    RepoSynced {
        owner: String,
        name: String,
        commits_added: usize,
    },

    /// A repository's sync run failed. The failure is recorded in its own
    /// sync log and does not abort a multi-repository sweep.
    RepoSyncFailed {
        owner: String,
        name: String,
        error: String,
    },

    /// Warning message (non-fatal).
    Warning {
        message: String,
    },
}

/// Callback for progress updates during sync operations.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn emit_with_callback_invokes_it() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        let callback: ProgressCallback = Box::new(move |_event| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        emit(
            Some(&callback),
            SyncProgress::FetchComplete {
                owner: "gitpulse".to_string(),
                name: "core".to_string(),
                total: 10,
            },
        );
        emit(
            Some(&callback),
            SyncProgress::DedupComplete {
                owner: "gitpulse".to_string(),
                name: "core".to_string(),
                new_count: 4,
                known_count: 6,
            },
        );

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn emit_without_callback_is_a_no_op() {
        emit(
            None,
            SyncProgress::Warning {
                message: "nothing listening".to_string(),
            },
        );
    }
}
