//! Repository entity - one row per allow-listed repository the dashboard tracks.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Repository model.
///
/// Rows are created by upsert on first sync. The natural key is
/// `(owner, name)`; it must match an allow-list entry before any fetch or
/// store is permitted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "repositories")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owner login (user or organization).
    pub owner: String,
    /// Repository name (URL-safe slug).
    pub name: String,
    /// Human-readable name shown in dashboard series.
    pub display_name: String,

    /// When the last successful sync run for this repository finished.
    pub last_sync_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A repository has many commits.
    #[sea_orm(has_many = "super::commit::Entity")]
    Commit,
}

impl Related<super::commit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Compute the full name (owner/name).
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_joins_owner_and_name() {
        let model = Model {
            id: Uuid::new_v4(),
            owner: "gitpulse".to_string(),
            name: "core".to_string(),
            display_name: "GitPulse Core".to_string(),
            last_sync_at: None,
        };
        assert_eq!(model.full_name(), "gitpulse/core");
    }
}
