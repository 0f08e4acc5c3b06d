//! Per-video trend series and their per-channel roll-ups.
//!
//! - [`series`] - hour-bucketed samples, keep-last dedup, JSON storage form
//! - [`store`] - the create-or-append transition applied on every scrape
//! - [`aggregate`] - channel totals summed per shared timestamp

pub mod aggregate;
pub mod series;
pub mod store;

pub use aggregate::aggregate_channel;
pub use series::{truncate_to_hour, Metric, MetricCounts, MetricSample, TrendSeries, TrendSet};
pub use store::{apply_snapshot, RecordWrite};

/// Errors raised while decoding stored trend data.
#[derive(Debug, thiserror::Error)]
pub enum TrendError {
    #[error("malformed trend series: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("malformed timestamp {0:?}, expected YYYY-MM-DD HH:MM:SS")]
    Timestamp(String),
}
