//! Temporal clustering of wishes and cross-year merging.

pub mod builder;
pub mod recurrence;

pub use builder::{ScoredTranscript, build_clusters};
pub use recurrence::{entity_date, group_by_calendar_day, merge_same_target, partition_by_target};
