//! SyncLog entity - append-only audit rows, one per sync run.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of sync run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum SyncType {
    /// Full list fetch across all pages.
    #[sea_orm(string_value = "full")]
    Full,
    /// Single-commit insert triggered by a webhook.
    #[sea_orm(string_value = "webhook")]
    Webhook,
}

/// Terminal state machine of a sync run: `started → completed | failed`.
///
/// Rows are finalized exactly once and never re-opened; retrying a failed run
/// is an external scheduling concern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum SyncStatus {
    #[sea_orm(string_value = "started")]
    Started,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// SyncLog model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_logs")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Kind of run.
    pub sync_type: SyncType,
    /// Run state.
    pub status: SyncStatus,
    /// The repository this run targeted, when known.
    pub repository_id: Option<Uuid>,
    /// Number of commit rows actually inserted by this run.
    pub commits_added: i32,
    /// Error message for failed runs.
    #[sea_orm(column_type = "Text", nullable)]
    pub error: Option<String>,
    /// When the run started.
    pub started_at: DateTimeWithTimeZone,
    /// When the run reached a terminal state.
    pub completed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A sync log may reference a repository.
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
