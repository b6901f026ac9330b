//! Commit row operations: dedup, bulk insert, backfill, range queries, and
//! the grouped aggregates shared by the timeline and the query facade.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Alias, Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::entity::commit::{ActiveModel, Column, Entity as Commit, Model};

use super::errors::{Result, StoreError};

/// Full SHA length; shorter inputs are treated as prefixes.
const FULL_SHA_LEN: usize = 40;

/// Platform account identity observed for an author email during a list fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorIdentity {
    pub login: String,
    pub avatar: Option<String>,
}

/// Totals of line changes over a date-filtered commit set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineChangeTotals {
    pub additions: i64,
    pub deletions: i64,
}

/// Per-author commit count over a date-filtered commit set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorCommitCount {
    pub author: String,
    pub commits: i64,
    pub additions: i64,
    pub deletions: i64,
}

/// All SHAs already persisted for a repository.
///
/// The sync engine diffs the full fetched list against this set before doing
/// any per-commit detail work, so duplicates cost no extra API calls.
pub async fn existing_shas(db: &DatabaseConnection, repository_id: Uuid) -> Result<HashSet<String>> {
    let shas: Vec<String> = Commit::find()
        .filter(Column::RepositoryId.eq(repository_id))
        .select_only()
        .column(Column::Sha)
        .into_tuple()
        .all(db)
        .await?;

    Ok(shas.into_iter().collect())
}

/// Bulk insert commits, silently skipping rows whose `(repository_id, sha)`
/// already exists.
///
/// Returns the number of rows actually inserted, which is how a sync run
/// reports `commits_added` accurately even when racing another run.
pub async fn insert_many_skipping_duplicates(
    db: &DatabaseConnection,
    models: Vec<ActiveModel>,
) -> Result<u64> {
    if models.is_empty() {
        return Ok(0);
    }

    Commit::insert_many(models)
        .on_conflict(
            OnConflict::columns([Column::RepositoryId, Column::Sha])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await
        .map_err(StoreError::from)
}

/// Backfill `author_login` / `author_avatar` on commits that lack them.
///
/// `identities` maps author emails to the platform account observed for that
/// email in the most recent list fetch. Each field is only ever written while
/// it is currently null - a non-null value is never overwritten, even when
/// freshly fetched data differs.
///
/// Returns the number of rows whose login was filled.
pub async fn backfill_author_identity(
    db: &DatabaseConnection,
    repository_id: Uuid,
    identities: &HashMap<String, AuthorIdentity>,
) -> Result<u64> {
    let mut touched = 0u64;

    for (email, identity) in identities {
        let result = Commit::update_many()
            .filter(Column::RepositoryId.eq(repository_id))
            .filter(Column::AuthorEmail.eq(email.as_str()))
            .filter(Column::AuthorLogin.is_null())
            .col_expr(Column::AuthorLogin, Expr::value(identity.login.clone()))
            .exec(db)
            .await?;
        touched += result.rows_affected;

        if let Some(avatar) = &identity.avatar {
            Commit::update_many()
                .filter(Column::RepositoryId.eq(repository_id))
                .filter(Column::AuthorEmail.eq(email.as_str()))
                .filter(Column::AuthorAvatar.is_null())
                .col_expr(Column::AuthorAvatar, Expr::value(avatar.clone()))
                .exec(db)
                .await?;
        }
    }

    Ok(touched)
}

/// Find commits for a set of repositories with `committed_at >= since`,
/// newest first. An optional search restricts to SHAs starting with the
/// given lowercase prefix.
pub async fn find_in_range(
    db: &DatabaseConnection,
    repository_ids: &[Uuid],
    since: DateTime<Utc>,
    search: Option<&str>,
) -> Result<Vec<Model>> {
    if repository_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = Commit::find()
        .filter(Column::RepositoryId.is_in(repository_ids.to_vec()))
        .filter(Column::CommittedAt.gte(since.fixed_offset()));

    if let Some(prefix) = search {
        query = query.filter(Column::Sha.starts_with(prefix));
    }

    query
        .order_by_desc(Column::CommittedAt)
        .all(db)
        .await
        .map_err(StoreError::from)
}

/// Count commits for a set of repositories with `committed_at >= since`.
pub async fn count_in_range(
    db: &DatabaseConnection,
    repository_ids: &[Uuid],
    since: DateTime<Utc>,
) -> Result<u64> {
    if repository_ids.is_empty() {
        return Ok(0);
    }

    Commit::find()
        .filter(Column::RepositoryId.is_in(repository_ids.to_vec()))
        .filter(Column::CommittedAt.gte(since.fixed_offset()))
        .count(db)
        .await
        .map_err(StoreError::from)
}

/// Sum additions and deletions over the same date-filtered commit set.
pub async fn sum_line_changes(
    db: &DatabaseConnection,
    repository_ids: &[Uuid],
    since: DateTime<Utc>,
) -> Result<LineChangeTotals> {
    if repository_ids.is_empty() {
        return Ok(LineChangeTotals::default());
    }

    let sums: Option<(Option<i64>, Option<i64>)> = Commit::find()
        .filter(Column::RepositoryId.is_in(repository_ids.to_vec()))
        .filter(Column::CommittedAt.gte(since.fixed_offset()))
        .select_only()
        .column_as(Column::Additions.sum(), "additions")
        .column_as(Column::Deletions.sum(), "deletions")
        .into_tuple()
        .one(db)
        .await?;

    let (additions, deletions) = sums.unwrap_or((None, None));
    Ok(LineChangeTotals {
        additions: additions.unwrap_or(0),
        deletions: deletions.unwrap_or(0),
    })
}

/// Per-author commit counts over the date-filtered set, most commits first.
pub async fn count_by_author(
    db: &DatabaseConnection,
    repository_ids: &[Uuid],
    since: DateTime<Utc>,
    limit: u64,
) -> Result<Vec<AuthorCommitCount>> {
    if repository_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<(String, i64, Option<i64>, Option<i64>)> = Commit::find()
        .filter(Column::RepositoryId.is_in(repository_ids.to_vec()))
        .filter(Column::CommittedAt.gte(since.fixed_offset()))
        .select_only()
        .column(Column::Author)
        .column_as(Column::Id.count(), "commit_count")
        .column_as(Column::Additions.sum(), "additions")
        .column_as(Column::Deletions.sum(), "deletions")
        .group_by(Column::Author)
        .order_by_desc(Expr::col(Alias::new("commit_count")))
        .limit(limit)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(author, commits, additions, deletions)| AuthorCommitCount {
            author,
            commits,
            additions: additions.unwrap_or(0),
            deletions: deletions.unwrap_or(0),
        })
        .collect())
}

/// Look up a single commit in a repository by full SHA or unique prefix.
pub async fn find_by_sha(
    db: &DatabaseConnection,
    repository_id: Uuid,
    sha: &str,
) -> Result<Option<Model>> {
    let mut query = Commit::find().filter(Column::RepositoryId.eq(repository_id));

    query = if sha.len() >= FULL_SHA_LEN {
        query.filter(Column::Sha.eq(sha))
    } else {
        query.filter(Column::Sha.starts_with(sha))
    };

    query.one(db).await.map_err(StoreError::from)
}

#[cfg(all(test, feature = "sqlite", feature = "migrate"))]
mod tests {
    use chrono::{Duration, Utc};
    use sea_orm::Set;

    use crate::connect_and_migrate;
    use crate::store::repos;

    use super::*;

    async fn setup_db() -> (DatabaseConnection, Uuid) {
        let db = connect_and_migrate("sqlite::memory:")
            .await
            .expect("test db should migrate");
        let repo = repos::upsert(&db, "gitpulse", "core", "GitPulse Core")
            .await
            .expect("repo upsert should insert");
        (db, repo.id)
    }

    fn model(
        repository_id: Uuid,
        sha: &str,
        author: &str,
        email: &str,
        committed_at: chrono::DateTime<Utc>,
        additions: i32,
        deletions: i32,
    ) -> ActiveModel {
        ActiveModel {
            id: Set(Uuid::new_v4()),
            repository_id: Set(repository_id),
            sha: Set(sha.to_string()),
            short_sha: Set(crate::entity::commit::short_sha(sha)),
            message: Set(format!("commit {sha}")),
            message_title: Set(format!("commit {sha}")),
            author: Set(author.to_string()),
            author_email: Set(email.to_string()),
            author_login: Set(None),
            author_avatar: Set(None),
            committed_at: Set(committed_at.fixed_offset()),
            additions: Set(additions),
            deletions: Set(deletions),
            files_changed: Set(1),
            is_merge_commit: Set(false),
        }
    }

    #[tokio::test]
    async fn insert_many_skips_duplicate_shas() {
        let (db, repo_id) = setup_db().await;
        let now = Utc::now();

        let first = vec![
            model(repo_id, "aaaa111", "Ada", "ada@example.com", now, 10, 2),
            model(repo_id, "bbbb222", "Ada", "ada@example.com", now, 5, 1),
        ];
        let inserted = insert_many_skipping_duplicates(&db, first)
            .await
            .expect("first insert should succeed");
        assert_eq!(inserted, 2);

        // Overlap: one duplicate, one new.
        let second = vec![
            model(repo_id, "bbbb222", "Ada", "ada@example.com", now, 5, 1),
            model(repo_id, "cccc333", "Grace", "grace@example.com", now, 7, 0),
        ];
        let inserted = insert_many_skipping_duplicates(&db, second)
            .await
            .expect("second insert should succeed");
        assert_eq!(inserted, 1);

        let shas = existing_shas(&db, repo_id).await.expect("shas query");
        assert_eq!(shas.len(), 3);
        assert!(shas.contains("cccc333"));
    }

    #[tokio::test]
    async fn insert_many_with_empty_input_is_zero() {
        let (db, _) = setup_db().await;
        let inserted = insert_many_skipping_duplicates(&db, Vec::new())
            .await
            .expect("empty insert should succeed");
        assert_eq!(inserted, 0);
    }

    #[tokio::test]
    async fn backfill_sets_null_fields_only() {
        let (db, repo_id) = setup_db().await;
        let now = Utc::now();

        let mut seeded = model(repo_id, "aaaa111", "Ada", "ada@example.com", now, 1, 1);
        seeded.author_login = Set(Some("ada-original".to_string()));
        insert_many_skipping_duplicates(
            &db,
            vec![
                seeded,
                model(repo_id, "bbbb222", "Grace", "grace@example.com", now, 1, 1),
            ],
        )
        .await
        .expect("seed insert should succeed");

        let mut identities = HashMap::new();
        identities.insert(
            "ada@example.com".to_string(),
            AuthorIdentity {
                login: "ada-new".to_string(),
                avatar: Some("https://example.com/ada.png".to_string()),
            },
        );
        identities.insert(
            "grace@example.com".to_string(),
            AuthorIdentity {
                login: "grace".to_string(),
                avatar: None,
            },
        );

        backfill_author_identity(&db, repo_id, &identities)
            .await
            .expect("backfill should succeed");

        let rows = find_in_range(&db, &[repo_id], now - Duration::days(1), None)
            .await
            .expect("range query");

        let ada = rows.iter().find(|c| c.sha == "aaaa111").expect("ada row");
        // Pre-existing login survives; avatar was null and gets filled.
        assert_eq!(ada.author_login.as_deref(), Some("ada-original"));
        assert_eq!(
            ada.author_avatar.as_deref(),
            Some("https://example.com/ada.png")
        );

        let grace = rows.iter().find(|c| c.sha == "bbbb222").expect("grace row");
        assert_eq!(grace.author_login.as_deref(), Some("grace"));
        assert!(grace.author_avatar.is_none());
    }

    #[tokio::test]
    async fn find_in_range_filters_by_date_and_prefix() {
        let (db, repo_id) = setup_db().await;
        let now = Utc::now();

        insert_many_skipping_duplicates(
            &db,
            vec![
                model(repo_id, "ab12ff0", "Ada", "a@example.com", now, 1, 0),
                model(
                    repo_id,
                    "ab12991",
                    "Ada",
                    "a@example.com",
                    now - Duration::days(2),
                    1,
                    0,
                ),
                model(repo_id, "ffff000", "Ada", "a@example.com", now, 1, 0),
                model(
                    repo_id,
                    "old0000",
                    "Ada",
                    "a@example.com",
                    now - Duration::days(30),
                    1,
                    0,
                ),
            ],
        )
        .await
        .expect("seed insert should succeed");

        let since = now - Duration::days(7);
        let all = find_in_range(&db, &[repo_id], since, None)
            .await
            .expect("range query");
        assert_eq!(all.len(), 3);
        // Newest first.
        assert!(all[0].committed_at >= all[1].committed_at);

        let matched = find_in_range(&db, &[repo_id], since, Some("ab12"))
            .await
            .expect("search query");
        assert_eq!(matched.len(), 2);
        assert!(matched.iter().all(|c| c.sha.starts_with("ab12")));
    }

    #[tokio::test]
    async fn aggregates_cover_the_filtered_window() {
        let (db, repo_id) = setup_db().await;
        let now = Utc::now();

        insert_many_skipping_duplicates(
            &db,
            vec![
                model(repo_id, "aaaa111", "Ada", "a@example.com", now, 10, 4),
                model(repo_id, "bbbb222", "Ada", "a@example.com", now, 5, 1),
                model(repo_id, "cccc333", "Grace", "g@example.com", now, 2, 2),
                model(
                    repo_id,
                    "dddd444",
                    "Old",
                    "o@example.com",
                    now - Duration::days(90),
                    100,
                    100,
                ),
            ],
        )
        .await
        .expect("seed insert should succeed");

        let since = now - Duration::days(7);

        let count = count_in_range(&db, &[repo_id], since).await.expect("count");
        assert_eq!(count, 3);

        let totals = sum_line_changes(&db, &[repo_id], since).await.expect("sums");
        assert_eq!(totals.additions, 17);
        assert_eq!(totals.deletions, 7);

        let authors = count_by_author(&db, &[repo_id], since, 10)
            .await
            .expect("authors");
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].author, "Ada");
        assert_eq!(authors[0].commits, 2);
        assert_eq!(authors[0].additions, 15);
        assert_eq!(authors[1].author, "Grace");
    }

    #[tokio::test]
    async fn find_by_sha_accepts_prefix() {
        let (db, repo_id) = setup_db().await;
        let now = Utc::now();
        let full = "ab12cd34ef56ab12cd34ef56ab12cd34ef56ab12";

        insert_many_skipping_duplicates(
            &db,
            vec![model(repo_id, full, "Ada", "a@example.com", now, 1, 0)],
        )
        .await
        .expect("seed insert should succeed");

        let by_prefix = find_by_sha(&db, repo_id, "ab12cd3")
            .await
            .expect("prefix lookup")
            .expect("commit should be found");
        assert_eq!(by_prefix.sha, full);

        let by_full = find_by_sha(&db, repo_id, full)
            .await
            .expect("full lookup")
            .expect("commit should be found");
        assert_eq!(by_full.id, by_prefix.id);

        let missing = find_by_sha(&db, repo_id, "0000000")
            .await
            .expect("missing lookup");
        assert!(missing.is_none());
    }
}
