//! Helpers shared by the command handlers.

use std::sync::Arc;

use gitpulse::{ApiRateLimiter, CacheStore, CommitClient, QueryFacade};
use sea_orm::DatabaseConnection;

use crate::config::Config;

/// Connect to the database, running pending migrations.
pub async fn connect(database_url: &str) -> Result<Arc<DatabaseConnection>, Box<dyn std::error::Error>> {
    Ok(Arc::new(gitpulse::connect_and_migrate(database_url).await?))
}

/// Build the commit API client from configuration.
///
/// Queries that never reach the network still construct a client; an empty
/// token only matters once a remote fallback actually fires.
pub fn build_client(config: &Config) -> Result<CommitClient, Box<dyn std::error::Error>> {
    let token = config.github_token().unwrap_or_default();
    let rate_limiter = if config.sync.no_rate_limit {
        None
    } else {
        Some(ApiRateLimiter::new(config.sync.requests_per_second))
    };

    let client = match &config.github.api_base {
        Some(base) => {
            let transport = gitpulse::http::ReqwestTransport::with_timeout(
                std::time::Duration::from_secs(30),
            )
            .map_err(|e| e.to_string())?;
            CommitClient::with_transport(base, &token, Arc::new(transport), rate_limiter)
        }
        None => CommitClient::new(&token, rate_limiter).map_err(|e| e.to_string())?,
    };

    Ok(client)
}

/// Build the query facade over a fresh connection.
pub async fn build_facade(
    config: &Config,
    database_url: &str,
) -> Result<QueryFacade, Box<dyn std::error::Error>> {
    let db = connect(database_url).await?;
    let cache = CacheStore::new(Arc::clone(&db));
    let client = build_client(config)?;
    Ok(QueryFacade::new(db, cache, client))
}

/// Split an `owner/name` argument.
pub fn parse_repo_arg(value: &str) -> Result<(&str, &str), Box<dyn std::error::Error>> {
    value
        .split_once('/')
        .ok_or_else(|| format!("Repository must be owner/name: {value:?}").into())
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_repo_arg_splits_on_first_slash() {
        let (owner, name) = parse_repo_arg("gitpulse/core").expect("valid");
        assert_eq!(owner, "gitpulse");
        assert_eq!(name, "core");

        assert!(parse_repo_arg("no-slash").is_err());
    }
}
