//! Repository row operations.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::allowlist::TrackedRepo;
use crate::entity::repository::{ActiveModel, Column, Entity as Repository, Model};

use super::errors::{Result, StoreError};

/// Find a repository by its UUID.
pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<Model>> {
    Repository::find_by_id(id)
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// Find a repository by its natural key (owner + name).
pub async fn find_by_owner_name(
    db: &DatabaseConnection,
    owner: &str,
    name: &str,
) -> Result<Option<Model>> {
    Repository::find()
        .filter(Column::Owner.eq(owner))
        .filter(Column::Name.eq(name))
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// Find the stored rows for a set of allow-list entries.
///
/// Repositories that have never been synced have no row yet and are simply
/// absent from the result; callers decide whether that means an empty series
/// or a remote fallback.
pub async fn find_tracked(
    db: &DatabaseConnection,
    tracked: &[&TrackedRepo],
) -> Result<Vec<Model>> {
    if tracked.is_empty() {
        return Ok(Vec::new());
    }

    let mut condition = Condition::any();
    for repo in tracked {
        condition = condition.add(
            Condition::all()
                .add(Column::Owner.eq(repo.owner))
                .add(Column::Name.eq(repo.name)),
        );
    }

    Repository::find()
        .filter(condition)
        .order_by_asc(Column::Owner)
        .order_by_asc(Column::Name)
        .all(db)
        .await
        .map_err(StoreError::from)
}

/// Insert or update a repository by its natural key.
///
/// If a repository with the same owner and name exists, its display name is
/// refreshed; otherwise a new row is inserted. `last_sync_at` is left
/// untouched here - [`touch_last_sync`] owns that field.
pub async fn upsert(
    db: &DatabaseConnection,
    owner: &str,
    name: &str,
    display_name: &str,
) -> Result<Model> {
    match find_by_owner_name(db, owner, name).await? {
        Some(existing) => {
            if existing.display_name == display_name {
                return Ok(existing);
            }
            let mut update: ActiveModel = existing.into();
            update.display_name = Set(display_name.to_string());
            update.update(db).await.map_err(StoreError::from)
        }
        None => {
            let model = ActiveModel {
                id: Set(Uuid::new_v4()),
                owner: Set(owner.to_string()),
                name: Set(name.to_string()),
                display_name: Set(display_name.to_string()),
                last_sync_at: Set(None),
            };
            model.insert(db).await.map_err(StoreError::from)
        }
    }
}

/// Record the completion instant of a successful sync run.
pub async fn touch_last_sync(
    db: &DatabaseConnection,
    id: Uuid,
    at: DateTime<Utc>,
) -> Result<()> {
    let Some(existing) = find_by_id(db, id).await? else {
        return Err(StoreError::not_found_by_id(id));
    };

    let mut update: ActiveModel = existing.into();
    update.last_sync_at = Set(Some(at.fixed_offset()));
    update.update(db).await?;
    Ok(())
}
