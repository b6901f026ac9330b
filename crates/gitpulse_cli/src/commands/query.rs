//! Read commands: timeline, commits, stats, contributors, languages, log.

use gitpulse::store;

use crate::config::Config;
use crate::QueryArgs;

use super::shared::{build_facade, connect, parse_repo_arg, print_json};

pub async fn handle_timeline(
    query: &QueryArgs,
    locale: &str,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let facade = build_facade(config, database_url).await?;
    let bundle = facade
        .timeline(query.repos.as_deref(), &query.range, locale)
        .await?;
    print_json(&bundle)
}

pub async fn handle_commits(
    query: &QueryArgs,
    search: Option<&str>,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let facade = build_facade(config, database_url).await?;
    let response = facade
        .commits(query.repos.as_deref(), &query.range, search)
        .await?;
    print_json(&response)
}

pub async fn handle_stats(
    query: &QueryArgs,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let facade = build_facade(config, database_url).await?;
    let response = facade.stats(query.repos.as_deref(), &query.range).await?;
    print_json(&response)
}

pub async fn handle_contributors(
    query: &QueryArgs,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let facade = build_facade(config, database_url).await?;
    let response = facade
        .contributors(query.repos.as_deref(), &query.range)
        .await?;
    print_json(&response)
}

pub async fn handle_languages(
    repo: &str,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (owner, name) = parse_repo_arg(repo)?;
    let facade = build_facade(config, database_url).await?;
    let languages = facade.languages(owner, name).await?;
    print_json(&languages)
}

pub async fn handle_overview(
    repo: &str,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (owner, name) = parse_repo_arg(repo)?;
    let facade = build_facade(config, database_url).await?;
    let overview = facade.repo_overview(owner, name).await?;
    print_json(&overview)
}

pub async fn handle_activity(
    repo: &str,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (owner, name) = parse_repo_arg(repo)?;
    let facade = build_facade(config, database_url).await?;
    let weeks = facade.commit_activity(owner, name).await?;
    print_json(&weeks)
}

pub async fn handle_log(
    limit: u64,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = connect(database_url).await?;
    let logs = store::sync_logs::recent(&db, limit).await?;
    print_json(&logs)
}
