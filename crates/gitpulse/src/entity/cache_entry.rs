//! CacheEntry entity - opaque serialized query results with a TTL.
//!
//! Keys are namespaced `{owner}:{name}:{operation}:{params…}` strings so that
//! a sync run can invalidate everything for one repository with a single
//! prefix delete. Multi-repository results live under the `all:` namespace.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// CacheEntry model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cache_entries")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Namespaced lookup key, unique.
    pub cache_key: String,

    /// Serialized cached value.
    #[sea_orm(column_type = "Json")]
    pub payload: Json,

    /// Entries are logically dead past this instant even if the row persists.
    pub expires_at: DateTimeWithTimeZone,

    /// When this entry was written.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Namespace prefix for results spanning multiple repositories.
pub const COMBINED_NAMESPACE: &str = "all";

impl Model {
    /// Prefix covering every cached operation for one repository.
    pub fn repo_prefix(owner: &str, name: &str) -> String {
        format!("{}:{}:", owner, name)
    }

    /// Prefix covering every cached multi-repository result.
    pub fn combined_prefix() -> String {
        format!("{}:", COMBINED_NAMESPACE)
    }

    /// Key for a single commit's detail view.
    pub fn commit_detail_key(owner: &str, name: &str, sha: &str) -> String {
        format!("{}:{}:detail:{}", owner, name, sha)
    }

    /// Key for a repository's language breakdown.
    pub fn languages_key(owner: &str, name: &str) -> String {
        format!("{}:{}:languages", owner, name)
    }

    /// Key for a repository's remote contributor stats.
    pub fn contributors_key(owner: &str, name: &str) -> String {
        format!("{}:{}:contributors", owner, name)
    }

    /// Key for a repository's metadata overview.
    pub fn overview_key(owner: &str, name: &str) -> String {
        format!("{}:{}:overview", owner, name)
    }

    /// Key for a repository's asynchronous commit-activity stat.
    pub fn activity_key(owner: &str, name: &str) -> String {
        format!("{}:{}:activity", owner, name)
    }

    /// Key for a multi-repository timeline.
    pub fn timeline_key(repos_token: &str, range: &str, locale: &str) -> String {
        format!("{}:timeline:{}:{}:{}", COMBINED_NAMESPACE, repos_token, range, locale)
    }

    /// Key for a multi-repository commit listing.
    pub fn commits_key(repos_token: &str, range: &str, search: Option<&str>) -> String {
        format!(
            "{}:commits:{}:{}:{}",
            COMBINED_NAMESPACE,
            repos_token,
            range,
            search.unwrap_or("")
        )
    }

    /// Key for multi-repository aggregate stats.
    pub fn stats_key(repos_token: &str, range: &str) -> String {
        format!("{}:stats:{}:{}", COMBINED_NAMESPACE, repos_token, range)
    }
}
