//! Sync commands.

use std::sync::Arc;

use gitpulse::sync;
use gitpulse::CacheStore;

use crate::config::Config;
use crate::progress;

use super::shared::{build_client, connect, parse_repo_arg};

pub async fn handle_sync(
    repo: Option<&str>,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if config.github_token().is_none() {
        return Err(
            "No API token configured. Set GITPULSE_GITHUB_TOKEN or add it to the config file."
                .into(),
        );
    }

    let db = connect(database_url).await?;
    let cache = CacheStore::new(Arc::clone(&db));
    let client = build_client(config)?;
    let on_progress = progress::reporter();

    match repo {
        Some(repo) => {
            let (owner, name) = parse_repo_arg(repo)?;
            let report = sync::sync_repository(
                &db,
                &client,
                Some(&cache),
                owner,
                name,
                None,
                Some(&on_progress),
            )
            .await?;
            println!(
                "{}/{}: {} commits added ({} listed, {} backfilled)",
                report.owner, report.name, report.commits_added, report.total_listed,
                report.backfilled
            );
        }
        None => {
            let summaries =
                sync::sync_all_repositories(&db, &client, Some(&cache), Some(&on_progress)).await;

            let mut failed = 0usize;
            for summary in &summaries {
                match &summary.error {
                    None => println!("{}: {} commits added", summary.repo, summary.commits_added),
                    Some(error) => {
                        failed += 1;
                        eprintln!("{}: FAILED - {}", summary.repo, error);
                    }
                }
            }

            if failed > 0 {
                return Err(format!("{failed} repositories failed to sync").into());
            }
        }
    }

    Ok(())
}
