//! Typed queries and mutations over the repository/commit schema.
//!
//! # Module Structure
//!
//! - [`repos`] - Repository rows: upsert, natural-key lookup, sync tracking
//! - [`commits`] - Commit rows: dedup, bulk insert, backfill, range queries,
//!   grouped aggregates
//! - [`sync_logs`] - Append-only audit rows for sync runs
//!
//! All functions are free functions over `&DatabaseConnection`; the database
//! uniqueness constraints plus skip-duplicate bulk insert are the only
//! synchronization primitives used.

pub mod commits;
pub mod repos;
pub mod sync_logs;

mod errors;

pub use errors::{Result, StoreError};
