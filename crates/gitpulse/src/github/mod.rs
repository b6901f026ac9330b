//! Authenticated client for the external commit API.
//!
//! # Module Structure
//!
//! - [`client`] - `CommitClient`: paginated commit list, commit detail,
//!   asynchronous aggregate-stat polling, repository metadata
//! - [`error`] - `FetchError`: the upstream error taxonomy
//! - [`types`] - Wire types deserialized from API responses
//! - [`convert`] - Wire type → commit row conversion

pub mod client;
pub mod convert;
pub mod error;
pub mod types;

pub use client::{CommitClient, StatEndpoint, DEFAULT_API_BASE, DEFAULT_PER_PAGE};
pub use error::FetchError;
pub use types::{
    AccountInfo, CommitActivityWeek, CommitDetail, CommitPage, CommitStats, CommitSummary,
    ContributorInfo, FileChange, LanguageBreakdown, RepoMetadata,
};
