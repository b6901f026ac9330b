//! Gap-free per-repository and combined commit timelines.
//!
//! # Module Structure
//!
//! - [`range`] - `TimeRange`, `PeriodConfig`, `Granularity`
//! - [`buckets`] - Bucket generation, keys, and locale-aware labels
//! - [`series`] - Typed series built from persisted commits
//!
//! Every produced timeline has exactly one point per bucket across the full
//! requested window; zero-commit buckets appear as explicit zeros.

pub mod buckets;
pub mod range;
pub mod series;

pub use buckets::{bucket_key, bucket_label, generate_buckets, parse_locale, start_date, start_date_at, week_start};
pub use range::{Granularity, PeriodConfig, TimeRange};
pub use series::{
    timeline, timeline_at, CombinedTimelinePoint, RepoSeries, SeriesRepo, TimelineBundle,
    TimelinePoint,
};
