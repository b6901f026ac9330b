//! Gitpulse - commit-history analytics pipeline for an allow-listed set of
//! repositories.
//!
//! The library reconciles a rate-limited external commit API with a
//! persistent store and a TTL cache, and serves gap-free, deduplicated,
//! multi-repository time series at daily and weekly granularity.
//!
//! # Features
//!
//! - `migrate` - Enables database migration support. When enabled, you can use
//!   [`connect_and_migrate`] to automatically run migrations on connection.
//! - `sqlite` / `postgres` - Database backends.
//!
//! # Example
//!
//! ```ignore
//! use gitpulse::{connect_and_migrate, CacheStore, CommitClient, QueryFacade};
//! use std::sync::Arc;
//!
//! let db = Arc::new(connect_and_migrate("sqlite://gitpulse.db?mode=rwc").await?);
//!
//! let client = CommitClient::new(&token, None)?;
//! gitpulse::sync::sync_all_repositories(&db, &client, None, None).await;
//!
//! let cache = CacheStore::new(Arc::clone(&db));
//! let facade = QueryFacade::new(db, cache, client);
//! let timeline = facade.timeline(None, "7d", "en-US").await?;
//! ```

pub mod allowlist;
pub mod cache;
pub mod db;
pub mod entity;
pub mod github;
pub mod http;
pub mod query;
pub mod rate_limit;
pub mod retry;
pub mod store;
pub mod sync;
pub mod timeline;

#[cfg(feature = "migrate")]
pub mod migration;

pub use allowlist::TrackedRepo;
pub use cache::CacheStore;
pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use github::{CommitClient, FetchError};
pub use query::{ApiError, ErrorCode, QueryFacade};
pub use rate_limit::ApiRateLimiter;
pub use store::StoreError;
pub use timeline::{Granularity, TimeRange};
