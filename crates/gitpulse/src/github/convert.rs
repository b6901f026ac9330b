//! Conversion from wire types to commit rows.

use sea_orm::Set;
use uuid::Uuid;

use crate::entity::commit::ActiveModel as CommitActiveModel;

use super::types::{CommitDetail, CommitSummary};

/// Build a commit row from a list summary plus its detail stats.
///
/// The detail carries the line stats the list endpoint omits; everything else
/// comes from the summary. Missing account identity stays null and is left to
/// a later backfill pass.
pub fn to_commit_model(
    repository_id: Uuid,
    summary: &CommitSummary,
    detail: &CommitDetail,
) -> CommitActiveModel {
    CommitActiveModel {
        id: Set(Uuid::new_v4()),
        repository_id: Set(repository_id),
        sha: Set(summary.sha.to_lowercase()),
        short_sha: Set(summary.short_sha().to_lowercase()),
        message: Set(summary.commit.message.clone()),
        message_title: Set(summary.message_title()),
        author: Set(summary.commit.author.name.clone()),
        author_email: Set(summary.commit.author.email.clone()),
        author_login: Set(summary.author.as_ref().map(|a| a.login.clone())),
        author_avatar: Set(summary
            .author
            .as_ref()
            .and_then(|a| a.avatar_url.clone())),
        committed_at: Set(summary.commit.author.date.fixed_offset()),
        additions: Set(detail.stats.additions),
        deletions: Set(detail.stats.deletions),
        files_changed: Set(detail.files.len() as i32),
        is_merge_commit: Set(summary.is_merge()),
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::ActiveValue;

    use super::*;

    fn summary() -> CommitSummary {
        serde_json::from_value(serde_json::json!({
            "sha": "AB12CD34EF56AB12CD34EF56AB12CD34EF56AB12",
            "commit": {
                "message": "feat: add weekly buckets\n\ndetails",
                "author": {
                    "name": "Ada Lovelace",
                    "email": "ada@example.com",
                    "date": "2026-07-30T10:00:00Z"
                }
            },
            "author": {"login": "ada", "avatar_url": "https://example.com/a.png"},
            "parents": [{"sha": "1111111111111111111111111111111111111111"}]
        }))
        .expect("summary should parse")
    }

    fn detail() -> CommitDetail {
        serde_json::from_value(serde_json::json!({
            "sha": "ab12cd34ef56ab12cd34ef56ab12cd34ef56ab12",
            "stats": {"additions": 8, "deletions": 2, "total": 10},
            "files": [
                {"filename": "src/timeline.rs", "additions": 8, "deletions": 2}
            ]
        }))
        .expect("detail should parse")
    }

    #[test]
    fn model_lowercases_sha_and_copies_stats() {
        let repo_id = Uuid::new_v4();
        let model = to_commit_model(repo_id, &summary(), &detail());

        assert_eq!(
            model.sha,
            ActiveValue::Set("ab12cd34ef56ab12cd34ef56ab12cd34ef56ab12".to_string())
        );
        assert_eq!(model.short_sha, ActiveValue::Set("ab12cd3".to_string()));
        assert_eq!(
            model.message_title,
            ActiveValue::Set("feat: add weekly buckets".to_string())
        );
        assert_eq!(model.additions, ActiveValue::Set(8));
        assert_eq!(model.deletions, ActiveValue::Set(2));
        assert_eq!(model.files_changed, ActiveValue::Set(1));
        assert_eq!(model.is_merge_commit, ActiveValue::Set(false));
        assert_eq!(model.author_login, ActiveValue::Set(Some("ada".to_string())));
    }
}
