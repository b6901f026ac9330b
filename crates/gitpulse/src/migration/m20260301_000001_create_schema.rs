//! Initial migration to create the gitpulse database schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_repositories(manager).await?;
        self.create_commits(manager).await?;
        self.create_sync_logs(manager).await?;
        self.create_cache_entries(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CacheEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SyncLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Commits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Repositories::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_repositories(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Repositories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Repositories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Repositories::Owner).string().not_null())
                    .col(ColumnDef::new(Repositories::Name).string().not_null())
                    .col(
                        ColumnDef::new(Repositories::DisplayName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Repositories::LastSyncAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on (owner, name)
        manager
            .create_index(
                Index::create()
                    .name("idx_repositories_owner_name")
                    .table(Repositories::Table)
                    .col(Repositories::Owner)
                    .col(Repositories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_commits(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Commits::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Commits::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Commits::RepositoryId).uuid().not_null())
                    .col(ColumnDef::new(Commits::Sha).string().not_null())
                    .col(ColumnDef::new(Commits::ShortSha).string().not_null())
                    .col(ColumnDef::new(Commits::Message).text().not_null())
                    .col(ColumnDef::new(Commits::MessageTitle).string().not_null())
                    .col(ColumnDef::new(Commits::Author).string().not_null())
                    .col(ColumnDef::new(Commits::AuthorEmail).string().not_null())
                    .col(ColumnDef::new(Commits::AuthorLogin).string().null())
                    .col(ColumnDef::new(Commits::AuthorAvatar).text().null())
                    .col(
                        ColumnDef::new(Commits::CommittedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Commits::Additions)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Commits::Deletions)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Commits::FilesChanged)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Commits::IsMergeCommit)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_commits_repository")
                            .from(Commits::Table, Commits::RepositoryId)
                            .to(Repositories::Table, Repositories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on (repository_id, sha) - the dedup anchor
        manager
            .create_index(
                Index::create()
                    .name("idx_commits_repository_sha")
                    .table(Commits::Table)
                    .col(Commits::RepositoryId)
                    .col(Commits::Sha)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index on committed_at for date-range filters
        manager
            .create_index(
                Index::create()
                    .name("idx_commits_committed_at")
                    .table(Commits::Table)
                    .col(Commits::CommittedAt)
                    .to_owned(),
            )
            .await?;

        // Composite index on (repository_id, committed_at) for timelines
        manager
            .create_index(
                Index::create()
                    .name("idx_commits_repository_committed_at")
                    .table(Commits::Table)
                    .col(Commits::RepositoryId)
                    .col(Commits::CommittedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_sync_logs(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SyncLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SyncLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SyncLogs::SyncType).string().not_null())
                    .col(ColumnDef::new(SyncLogs::Status).string().not_null())
                    .col(ColumnDef::new(SyncLogs::RepositoryId).uuid().null())
                    .col(
                        ColumnDef::new(SyncLogs::CommitsAdded)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(SyncLogs::Error).text().null())
                    .col(
                        ColumnDef::new(SyncLogs::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SyncLogs::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Index on started_at for recency queries
        manager
            .create_index(
                Index::create()
                    .name("idx_sync_logs_started_at")
                    .table(SyncLogs::Table)
                    .col(SyncLogs::StartedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_cache_entries(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CacheEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CacheEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CacheEntries::CacheKey).string().not_null())
                    .col(ColumnDef::new(CacheEntries::Payload).json().not_null())
                    .col(
                        ColumnDef::new(CacheEntries::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CacheEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on cache_key - the upsert anchor
        manager
            .create_index(
                Index::create()
                    .name("idx_cache_entries_key")
                    .table(CacheEntries::Table)
                    .col(CacheEntries::CacheKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index on expires_at for purging
        manager
            .create_index(
                Index::create()
                    .name("idx_cache_entries_expires_at")
                    .table(CacheEntries::Table)
                    .col(CacheEntries::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
#[sea_orm(iden = "repositories")]
enum Repositories {
    Table,
    Id,
    Owner,
    Name,
    DisplayName,
    LastSyncAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "commits")]
enum Commits {
    Table,
    Id,
    RepositoryId,
    Sha,
    ShortSha,
    Message,
    MessageTitle,
    Author,
    AuthorEmail,
    AuthorLogin,
    AuthorAvatar,
    CommittedAt,
    Additions,
    Deletions,
    FilesChanged,
    IsMergeCommit,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "sync_logs")]
enum SyncLogs {
    Table,
    Id,
    SyncType,
    Status,
    RepositoryId,
    CommitsAdded,
    Error,
    StartedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "cache_entries")]
enum CacheEntries {
    Table,
    Id,
    CacheKey,
    Payload,
    ExpiresAt,
    CreatedAt,
}
