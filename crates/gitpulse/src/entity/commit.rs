//! Commit entity - one row per commit per tracked repository.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Length of the derived short-SHA prefix.
pub const SHORT_SHA_LEN: usize = 7;

/// Commit model.
///
/// The natural key is `(repository_id, sha)`. Core fields are immutable once
/// written; only `author_login` and `author_avatar` may be backfilled later,
/// and only while they are null.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commits")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// The repository this commit belongs to.
    pub repository_id: Uuid,

    // ─── Identity ────────────────────────────────────────────────────────────
    /// Full content-addressed commit identifier (lowercase hex).
    pub sha: String,
    /// Derived 7-character prefix of the SHA.
    pub short_sha: String,

    // ─── Content ─────────────────────────────────────────────────────────────
    /// Full commit message.
    #[sea_orm(column_type = "Text")]
    pub message: String,
    /// First line of the commit message.
    pub message_title: String,

    // ─── Authorship ──────────────────────────────────────────────────────────
    /// Git author name.
    pub author: String,
    /// Git author email.
    pub author_email: String,
    /// Platform account login, backfilled when the author identity is known.
    pub author_login: Option<String>,
    /// Platform avatar URL, backfilled alongside the login.
    #[sea_orm(column_type = "Text", nullable)]
    pub author_avatar: Option<String>,

    // ─── Stats ───────────────────────────────────────────────────────────────
    /// When the commit was authored.
    pub committed_at: DateTimeWithTimeZone,
    /// Lines added.
    pub additions: i32,
    /// Lines removed.
    pub deletions: i32,
    /// Number of files touched.
    pub files_changed: i32,
    /// Whether the commit has more than one parent.
    #[sea_orm(default_value = false)]
    pub is_merge_commit: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A commit belongs to a repository.
    #[sea_orm(
        belongs_to = "super::repository::Entity",
        from = "Column::RepositoryId",
        to = "super::repository::Column::Id"
    )]
    Repository,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Derive the short SHA prefix from a full SHA.
pub fn short_sha(sha: &str) -> String {
    sha.chars().take(SHORT_SHA_LEN).collect()
}

/// Extract the first line of a commit message.
pub fn message_title(message: &str) -> String {
    message.lines().next().unwrap_or_default().to_string()
}
