//! SyncLog row operations.
//!
//! Rows are append-only: created as `started` at the beginning of a run and
//! finalized exactly once as `completed` or `failed`. There is no transition
//! out of a terminal state.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::sync_log::{ActiveModel, Column, Entity as SyncLog, Model, SyncStatus, SyncType};

use super::errors::{Result, StoreError};

/// Create a `started` audit row for a new sync run.
pub async fn start(
    db: &DatabaseConnection,
    sync_type: SyncType,
    repository_id: Option<Uuid>,
) -> Result<Model> {
    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        sync_type: Set(sync_type),
        status: Set(SyncStatus::Started),
        repository_id: Set(repository_id),
        commits_added: Set(0),
        error: Set(None),
        started_at: Set(Utc::now().fixed_offset()),
        completed_at: Set(None),
    };

    model.insert(db).await.map_err(StoreError::from)
}

/// Finalize a run as `completed` with the number of commits it added.
pub async fn finish_completed(
    db: &DatabaseConnection,
    id: Uuid,
    repository_id: Option<Uuid>,
    commits_added: i32,
) -> Result<()> {
    finalize(db, id, repository_id, SyncStatus::Completed, commits_added, None).await
}

/// Finalize a run as `failed` with its error message.
pub async fn finish_failed(
    db: &DatabaseConnection,
    id: Uuid,
    repository_id: Option<Uuid>,
    error: &str,
) -> Result<()> {
    finalize(db, id, repository_id, SyncStatus::Failed, 0, Some(error)).await
}

async fn finalize(
    db: &DatabaseConnection,
    id: Uuid,
    repository_id: Option<Uuid>,
    status: SyncStatus,
    commits_added: i32,
    error: Option<&str>,
) -> Result<()> {
    let Some(existing) = SyncLog::find_by_id(id).one(db).await? else {
        return Err(StoreError::not_found_by_id(id));
    };

    if existing.status != SyncStatus::Started {
        return Err(StoreError::invalid_input(format!(
            "sync log {} already finalized as {:?}",
            id, existing.status
        )));
    }

    let mut update: ActiveModel = existing.into();
    update.status = Set(status);
    update.commits_added = Set(commits_added);
    update.error = Set(error.map(String::from));
    update.completed_at = Set(Some(Utc::now().fixed_offset()));
    if repository_id.is_some() {
        update.repository_id = Set(repository_id);
    }
    update.update(db).await?;
    Ok(())
}

/// Most recent sync runs, newest first.
pub async fn recent(db: &DatabaseConnection, limit: u64) -> Result<Vec<Model>> {
    SyncLog::find()
        .order_by_desc(Column::StartedAt)
        .limit(limit)
        .all(db)
        .await
        .map_err(StoreError::from)
}

#[cfg(all(test, feature = "sqlite", feature = "migrate"))]
mod tests {
    use crate::connect_and_migrate;

    use super::*;

    async fn setup_db() -> DatabaseConnection {
        connect_and_migrate("sqlite::memory:")
            .await
            .expect("test db should migrate")
    }

    #[tokio::test]
    async fn start_then_complete_records_counts() {
        let db = setup_db().await;
        let log = start(&db, SyncType::Full, None).await.expect("start");
        assert_eq!(log.status, SyncStatus::Started);
        assert!(log.completed_at.is_none());

        let repo_id = Uuid::new_v4();
        finish_completed(&db, log.id, Some(repo_id), 42)
            .await
            .expect("finish");

        let rows = recent(&db, 10).await.expect("recent");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, SyncStatus::Completed);
        assert_eq!(rows[0].commits_added, 42);
        assert_eq!(rows[0].repository_id, Some(repo_id));
        assert!(rows[0].completed_at.is_some());
    }

    #[tokio::test]
    async fn failed_run_records_error() {
        let db = setup_db().await;
        let log = start(&db, SyncType::Full, None).await.expect("start");

        finish_failed(&db, log.id, None, "upstream 500")
            .await
            .expect("finish");

        let rows = recent(&db, 10).await.expect("recent");
        assert_eq!(rows[0].status, SyncStatus::Failed);
        assert_eq!(rows[0].error.as_deref(), Some("upstream 500"));
        assert_eq!(rows[0].commits_added, 0);
    }

    #[tokio::test]
    async fn terminal_rows_cannot_be_reopened() {
        let db = setup_db().await;
        let log = start(&db, SyncType::Webhook, None).await.expect("start");
        finish_completed(&db, log.id, None, 1).await.expect("finish");

        let err = finish_failed(&db, log.id, None, "late failure")
            .await
            .expect_err("second finalize should fail");
        assert!(matches!(err, StoreError::InvalidInput { .. }));
    }
}
