//! Gitpulse CLI - sync trigger and query runner for the commit analytics
//! pipeline.

mod commands;
mod config;
mod progress;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gitpulse")]
#[command(version)]
#[command(about = "Commit-history analytics for an allow-listed set of repositories")]
#[command(
    long_about = "Gitpulse ingests commit history for a fixed allow-list of repositories \
from the GitHub API into a local database and serves gap-free, deduplicated \
commit timelines, listings, and aggregate stats from it."
)]
#[command(after_long_help = r#"EXAMPLES
    Run migrations, then sync every tracked repository:
        $ gitpulse migrate up
        $ gitpulse sync

    Sync a single repository:
        $ gitpulse sync --repo gitpulse/core

    Print the 7-day combined timeline as JSON:
        $ gitpulse timeline --range 7d

    Search commits by SHA prefix across two repositories:
        $ gitpulse commits --range 30d --repos '["gitpulse/core","gitpulse/docs"]' --search ab12

CONFIGURATION
    Gitpulse reads configuration from:
      1. ~/.config/gitpulse/config.toml (or $XDG_CONFIG_HOME/gitpulse/config.toml)
      2. ./gitpulse.toml
      3. Environment variables (GITPULSE_* prefix)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    GITPULSE_DATABASE_URL     Database connection string (default: ~/.local/state/gitpulse/gitpulse.db)
    GITPULSE_GITHUB_TOKEN     API token used for sync and remote fallbacks
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Sync commit history from the remote API
    Sync {
        /// Sync only this repository (owner/name); all tracked repos otherwise
        #[arg(short, long)]
        repo: Option<String>,
    },
    /// Print per-repository and combined commit timelines
    Timeline {
        #[command(flatten)]
        query: QueryArgs,
        /// Locale for bucket labels (BCP-47, e.g. en-US, de-DE)
        #[arg(short, long, default_value = "en-US")]
        locale: String,
    },
    /// List commits, optionally filtered by SHA prefix
    Commits {
        #[command(flatten)]
        query: QueryArgs,
        /// SHA prefix to search for (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Print aggregate stats over the window
    Stats {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Print the contributor ranking over the window
    Contributors {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Print the language breakdown for one repository
    Languages {
        /// Repository (owner/name)
        repo: String,
    },
    /// Print repository metadata (size, stars, primary language)
    Overview {
        /// Repository (owner/name)
        repo: String,
    },
    /// Print the weekly commit-activity stat (polls while upstream computes)
    Activity {
        /// Repository (owner/name)
        repo: String,
    },
    /// Show recent sync runs
    Log {
        /// Number of runs to show
        #[arg(short, long, default_value_t = 20)]
        limit: u64,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

/// Options shared by every read operation.
#[derive(Debug, Clone, clap::Args)]
struct QueryArgs {
    /// Time range: 7d, 30d, 6m, or 12m
    #[arg(short = 'r', long, default_value = "7d")]
    range: String,

    /// JSON array of "owner/name" entries; all tracked repos when omitted
    #[arg(long)]
    repos: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gitpulse=info,gitpulse_cli=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::load();
    let cli = Cli::parse();

    // Completions don't need database access.
    if let Commands::Completions { shell } = &cli.command {
        commands::meta::handle_completions(*shell)?;
        return Ok(());
    }

    let database_url = config
        .database_url()
        .ok_or("Failed to determine database URL")?;

    // Ensure the database directory exists for SQLite.
    if database_url.starts_with("sqlite://") {
        let db_path = database_url.trim_start_matches("sqlite://");
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        let db_path = std::path::Path::new(db_path);

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    match cli.command {
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Sync { repo } => {
            commands::sync::handle_sync(repo.as_deref(), &config, &database_url).await?;
        }
        Commands::Timeline { query, locale } => {
            commands::query::handle_timeline(&query, &locale, &config, &database_url).await?;
        }
        Commands::Commits { query, search } => {
            commands::query::handle_commits(&query, search.as_deref(), &config, &database_url)
                .await?;
        }
        Commands::Stats { query } => {
            commands::query::handle_stats(&query, &config, &database_url).await?;
        }
        Commands::Contributors { query } => {
            commands::query::handle_contributors(&query, &config, &database_url).await?;
        }
        Commands::Languages { repo } => {
            commands::query::handle_languages(&repo, &config, &database_url).await?;
        }
        Commands::Overview { repo } => {
            commands::query::handle_overview(&repo, &config, &database_url).await?;
        }
        Commands::Activity { repo } => {
            commands::query::handle_activity(&repo, &config, &database_url).await?;
        }
        Commands::Log { limit } => {
            commands::query::handle_log(limit, &database_url).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
