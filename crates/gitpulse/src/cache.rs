//! Cache-aside layer over the `cache_entries` table.
//!
//! The cache never participates in correctness: every failure - database
//! down, payload undeserializable, write lost - degrades to a miss and is
//! logged at debug level. Callers never see a cache error.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::entity::cache_entry::{ActiveModel, Column, Entity as CacheEntry};

/// TTL policy. Shorter windows churn faster and get shorter TTLs; immutable
/// per-commit detail keeps the longest.
pub mod ttl {
    use std::time::Duration;

    use crate::timeline::TimeRange;

    /// 7-day window queries.
    pub const RANGE_7D: Duration = Duration::from_secs(5 * 60);
    /// 30-day window queries.
    pub const RANGE_30D: Duration = Duration::from_secs(15 * 60);
    /// 6-month window queries.
    pub const RANGE_6M: Duration = Duration::from_secs(60 * 60);
    /// 12-month window queries.
    pub const RANGE_12M: Duration = Duration::from_secs(2 * 60 * 60);
    /// Per-commit detail is immutable once written.
    pub const COMMIT_DETAIL: Duration = Duration::from_secs(24 * 60 * 60);
    /// Remote language / contributor stats.
    pub const REMOTE_STATS: Duration = Duration::from_secs(6 * 60 * 60);

    /// TTL for a window-scoped query result.
    pub fn for_range(range: TimeRange) -> Duration {
        match range {
            TimeRange::Days7 => RANGE_7D,
            TimeRange::Days30 => RANGE_30D,
            TimeRange::Months6 => RANGE_6M,
            TimeRange::Months12 => RANGE_12M,
        }
    }
}

/// Cache-aside key/value store with per-operation TTLs.
#[derive(Clone)]
pub struct CacheStore {
    db: Arc<DatabaseConnection>,
}

impl CacheStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Read a value. Absent, expired, and failed reads are all a miss.
    ///
    /// Expired rows are deleted lazily on read so they can never be served
    /// again even if the periodic purge lags.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = match CacheEntry::find()
            .filter(Column::CacheKey.eq(key))
            .one(self.db.as_ref())
            .await
        {
            Ok(entry) => entry?,
            Err(e) => {
                tracing::debug!(key, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        if entry.expires_at <= Utc::now().fixed_offset() {
            let db = Arc::clone(&self.db);
            let id = entry.id;
            tokio::spawn(async move {
                if let Err(e) = CacheEntry::delete_by_id(id).exec(db.as_ref()).await {
                    tracing::debug!(error = %e, "expired cache entry delete failed");
                }
            });
            return None;
        }

        match serde_json::from_value(entry.payload) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(key, error = %e, "cache payload undeserializable, treating as miss");
                None
            }
        }
    }

    /// Write a value, best-effort. Failures are swallowed.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let payload = match serde_json::to_value(value) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!(key, error = %e, "cache payload unserializable, skipping write");
                return;
            }
        };
        self.set_raw(key, payload, ttl).await;
    }

    async fn set_raw(&self, key: &str, payload: serde_json::Value, ttl: Duration) {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero());

        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            cache_key: Set(key.to_string()),
            payload: Set(payload),
            expires_at: Set(expires_at.fixed_offset()),
            created_at: Set(now.fixed_offset()),
        };

        let result = CacheEntry::insert(model)
            .on_conflict(
                OnConflict::column(Column::CacheKey)
                    .update_columns([Column::Payload, Column::ExpiresAt, Column::CreatedAt])
                    .to_owned(),
            )
            .exec(self.db.as_ref())
            .await;

        if let Err(e) = result {
            tracing::debug!(key, error = %e, "cache write failed, ignoring");
        }
    }

    /// Cache-aside read: on a hit return the cached value; on a miss run the
    /// producer, hand its result back immediately, and write the cache entry
    /// on a spawned task so the caller never waits on the write outcome.
    ///
    /// Only successful producer results are cached.
    pub async fn with_cache<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(key).await {
            return Ok(hit);
        }

        let value = producer().await?;

        if let Ok(payload) = serde_json::to_value(&value) {
            let store = self.clone();
            let key = key.to_string();
            tokio::spawn(async move {
                store.set_raw(&key, payload, ttl).await;
            });
        }

        Ok(value)
    }

    /// Delete one entry. Returns whether a row was removed; errors read as false.
    pub async fn invalidate(&self, key: &str) -> bool {
        match CacheEntry::delete_many()
            .filter(Column::CacheKey.eq(key))
            .exec(self.db.as_ref())
            .await
        {
            Ok(result) => result.rows_affected > 0,
            Err(e) => {
                tracing::debug!(key, error = %e, "cache invalidate failed");
                false
            }
        }
    }

    /// Delete every entry whose key starts with `prefix`. Returns the number
    /// of rows removed; errors read as zero.
    pub async fn invalidate_prefix(&self, prefix: &str) -> u64 {
        match CacheEntry::delete_many()
            .filter(Column::CacheKey.starts_with(prefix))
            .exec(self.db.as_ref())
            .await
        {
            Ok(result) => result.rows_affected,
            Err(e) => {
                tracing::debug!(prefix, error = %e, "cache prefix invalidate failed");
                0
            }
        }
    }

    /// Delete every expired entry. Housekeeping, safe to call any time.
    pub async fn purge_expired(&self) -> u64 {
        match CacheEntry::delete_many()
            .filter(Column::ExpiresAt.lte(Utc::now().fixed_offset()))
            .exec(self.db.as_ref())
            .await
        {
            Ok(result) => result.rows_affected,
            Err(e) => {
                tracing::debug!(error = %e, "cache purge failed");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::TimeRange;

    #[test]
    fn shorter_ranges_get_shorter_ttls() {
        assert!(ttl::for_range(TimeRange::Days7) < ttl::for_range(TimeRange::Days30));
        assert!(ttl::for_range(TimeRange::Days30) < ttl::for_range(TimeRange::Months6));
        assert!(ttl::for_range(TimeRange::Months6) < ttl::for_range(TimeRange::Months12));
        assert!(ttl::for_range(TimeRange::Months12) < ttl::COMMIT_DETAIL);
    }
}
