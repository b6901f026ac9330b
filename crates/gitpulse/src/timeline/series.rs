//! Typed timeline series built from persisted commits.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store;
use crate::store::StoreError;

use super::buckets::{bucket_key, bucket_label, generate_buckets, parse_locale, start_date_at};
use super::range::TimeRange;

/// A repository to build a series for.
///
/// `id` is `None` when the repository has never been synced; its series is
/// all zeros but still spans the full bucket list.
#[derive(Debug, Clone)]
pub struct SeriesRepo {
    pub id: Option<Uuid>,
    pub owner: String,
    pub name: String,
    pub display_name: String,
}

/// One bucket of a single repository's series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub label: String,
    pub commits: i64,
}

/// A single repository's gap-free series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoSeries {
    pub owner: String,
    pub name: String,
    pub display_name: String,
    pub points: Vec<TimelinePoint>,
}

/// One bucket of the combined series, with a per-repository count map keyed
/// by display name flattened into the serialized object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedTimelinePoint {
    pub date: NaiveDate,
    pub label: String,
    #[serde(flatten)]
    pub counts: BTreeMap<String, i64>,
}

/// Per-repository series plus the combined series for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineBundle {
    pub range: TimeRange,
    pub series: Vec<RepoSeries>,
    pub combined: Vec<CombinedTimelinePoint>,
}

/// Build the timeline for a set of repositories, anchored at `now`.
///
/// Commits are grouped into bucket keys and left-merged against the generated
/// bucket list, so empty buckets appear as explicit zeros and the sum over
/// any series equals the persisted commit count in the window.
pub async fn timeline_at(
    db: &DatabaseConnection,
    repos: &[SeriesRepo],
    range: TimeRange,
    locale_tag: &str,
    now: DateTime<Utc>,
) -> Result<TimelineBundle, StoreError> {
    let cfg = range.config();
    let start = start_date_at(range, now);
    let buckets = generate_buckets(start.date_naive(), now.date_naive(), cfg.granularity);
    let locale = parse_locale(locale_tag);

    let repo_ids: Vec<Uuid> = repos.iter().filter_map(|r| r.id).collect();
    let rows = store::commits::find_in_range(db, &repo_ids, start, None).await?;

    // Group persisted commits into bucket keys per repository.
    let mut counts: HashMap<Uuid, HashMap<NaiveDate, i64>> = HashMap::new();
    for row in &rows {
        let key = bucket_key(
            row.committed_at.with_timezone(&Utc).date_naive(),
            cfg.granularity,
        );
        *counts
            .entry(row.repository_id)
            .or_default()
            .entry(key)
            .or_insert(0) += 1;
    }

    let mut series = Vec::with_capacity(repos.len());
    let mut combined: Vec<CombinedTimelinePoint> = buckets
        .iter()
        .map(|date| CombinedTimelinePoint {
            date: *date,
            label: bucket_label(*date, cfg.granularity, locale),
            counts: BTreeMap::new(),
        })
        .collect();

    for repo in repos {
        let repo_counts = repo.id.and_then(|id| counts.get(&id));

        let points: Vec<TimelinePoint> = buckets
            .iter()
            .map(|date| TimelinePoint {
                date: *date,
                label: bucket_label(*date, cfg.granularity, locale),
                commits: repo_counts
                    .and_then(|c| c.get(date).copied())
                    .unwrap_or(0),
            })
            .collect();

        for (slot, point) in combined.iter_mut().zip(points.iter()) {
            slot.counts.insert(repo.display_name.clone(), point.commits);
        }

        series.push(RepoSeries {
            owner: repo.owner.clone(),
            name: repo.name.clone(),
            display_name: repo.display_name.clone(),
            points,
        });
    }

    Ok(TimelineBundle {
        range,
        series,
        combined,
    })
}

/// [`timeline_at`] anchored to the current instant.
pub async fn timeline(
    db: &DatabaseConnection,
    repos: &[SeriesRepo],
    range: TimeRange,
    locale_tag: &str,
) -> Result<TimelineBundle, StoreError> {
    timeline_at(db, repos, range, locale_tag, Utc::now()).await
}
