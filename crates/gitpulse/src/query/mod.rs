//! Read-side boundary: parameter validation and the query facade.
//!
//! # Module Structure
//!
//! - [`error`] - `ApiError` / `ErrorCode`, the boundary error payload
//! - [`validate`] - Range / repository-list / SHA / search validation,
//!   raised before any I/O
//! - [`facade`] - `QueryFacade`: commits, detail, timeline, stats,
//!   contributors, languages over store + cache (+ remote on cold cache)

pub mod error;
pub mod facade;
pub mod validate;

pub use error::{ApiError, ErrorCode};
pub use facade::{
    CommitDetailResponse, CommitView, CommitsResponse, ContributorEntry, ContributorsResponse,
    QueryFacade, RepoCommits, RepoSummary, StatSource, StatsResponse, TaggedCommit,
};
