//! Human-readable sync progress on stderr.

use console::style;
use gitpulse::sync::{ProgressCallback, SyncProgress};

/// Build a progress callback that prints key events to stderr.
///
/// Interactive terminals get styled one-liners; everything also flows through
/// tracing at debug level so non-TTY runs keep a structured record.
pub fn reporter() -> ProgressCallback {
    let is_term = console::Term::stderr().is_term();

    Box::new(move |event| {
        tracing::debug!(?event, "sync progress");

        if !is_term {
            return;
        }

        match event {
            SyncProgress::FetchingCommits { owner, name } => {
                eprintln!("{} {}/{}", style("Syncing").cyan().bold(), owner, name);
            }
            SyncProgress::FetchedPage {
                page, total_so_far, ..
            } => {
                eprintln!("  page {page} fetched ({total_so_far} commits listed)");
            }
            SyncProgress::DedupComplete {
                new_count,
                known_count,
                ..
            } => {
                eprintln!("  {new_count} new, {known_count} already known");
            }
            SyncProgress::PersistedBatch { total_added, .. } => {
                eprintln!("  {total_added} commits persisted");
            }
            SyncProgress::BackfillComplete { updated, .. } if updated > 0 => {
                eprintln!("  {updated} author identities backfilled");
            }
            SyncProgress::RepoSynced {
                owner,
                name,
                commits_added,
            } => {
                eprintln!(
                    "{} {}/{} (+{} commits)",
                    style("Done").green().bold(),
                    owner,
                    name,
                    commits_added
                );
            }
            SyncProgress::RepoSyncFailed { owner, name, error } => {
                eprintln!(
                    "{} {}/{}: {}",
                    style("Failed").red().bold(),
                    owner,
                    name,
                    error
                );
            }
            SyncProgress::Warning { message } => {
                eprintln!("{} {}", style("Warning").yellow().bold(), message);
            }
            _ => {}
        }
    })
}
