//! Configuration file support for the gitpulse CLI.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `GITPULSE_`, e.g., `GITPULSE_DATABASE_URL`)
//! 3. Config file (~/.config/gitpulse/config.toml or ./gitpulse.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/gitpulse/gitpulse.db"  # optional, this is the default
//!
//! [github]
//! token = "ghp_..."  # or use GITPULSE_GITHUB_TOKEN env var
//!
//! [sync]
//! requests_per_second = 10
//! no_rate_limit = false
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Commit API configuration.
    pub github: GitHubConfig,
    /// Sync pacing options.
    pub sync: SyncConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL. Supports sqlite:// and postgres:// schemes.
    /// Defaults to `sqlite://~/.local/state/gitpulse/gitpulse.db` if not specified.
    pub url: Option<String>,
}

/// Commit API configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// API token. Can also be set via GITPULSE_GITHUB_TOKEN.
    pub token: Option<String>,
    /// Override of the API base URL (useful against a proxy or a test stub).
    pub api_base: Option<String>,
}

/// Sync pacing options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Proactive rate limit applied before each API request.
    pub requests_per_second: u32,
    /// Disable proactive rate limiting (may cause API throttling).
    pub no_rate_limit: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            requests_per_second: gitpulse::rate_limit::DEFAULT_RPS,
            no_rate_limit: false,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(proj_dirs) = ProjectDirs::from("", "", "gitpulse") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("Loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        let local_config = PathBuf::from("gitpulse.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./gitpulse.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., GITPULSE_DATABASE_URL -> database.url
        builder = builder.add_source(
            Environment::with_prefix("GITPULSE")
                .separator("_")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// The `mode=rwc` parameter enables read-write access and creates the
    /// file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("gitpulse.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// Get the API token.
    pub fn github_token(&self) -> Option<String> {
        self.github.token.clone()
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/gitpulse` or `~/.local/state/gitpulse`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "gitpulse").map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = Config::default();
        assert!(config.database.url.is_none());
        assert!(config.github.token.is_none());
        assert!(config.github.api_base.is_none());
        assert_eq!(
            config.sync.requests_per_second,
            gitpulse::rate_limit::DEFAULT_RPS
        );
        assert!(!config.sync.no_rate_limit);
    }

    #[test]
    fn toml_content_overrides_defaults() {
        let toml_content = r#"
            [database]
            url = "sqlite:///tmp/test.db"

            [github]
            token = "ghp_test123"

            [sync]
            requests_per_second = 3
        "#;

        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .expect("builder should succeed");
        let config: Config = settings.try_deserialize().expect("deserialize");

        assert_eq!(config.database.url.as_deref(), Some("sqlite:///tmp/test.db"));
        assert_eq!(config.github.token.as_deref(), Some("ghp_test123"));
        assert_eq!(config.sync.requests_per_second, 3);
    }

    #[test]
    fn database_url_defaults_to_state_dir() {
        let config = Config::default();
        let url = config.database_url().expect("default url");
        assert!(url.starts_with("sqlite://"));
        assert!(url.contains("gitpulse.db"));
        assert!(url.ends_with("?mode=rwc"));
    }

    #[test]
    fn database_url_respects_configured_value() {
        let config = Config {
            database: DatabaseConfig {
                url: Some("postgres://localhost/gitpulse".to_string()),
            },
            ..Config::default()
        };
        assert_eq!(
            config.database_url().as_deref(),
            Some("postgres://localhost/gitpulse")
        );
    }
}
