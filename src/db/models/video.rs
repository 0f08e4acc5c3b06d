use chrono::NaiveDateTime;
use serde::Serialize;

use crate::scoring::IntegrityScore;
use crate::trend::TrendSet;

/// One tracked video (PostgreSQL `trendwatch.videos`).
///
/// Primary Key: url
///
/// `channel_url`, `upload_date` and `integrity_score` are fixed when the row
/// is created; every later scrape overwrites the counters, title, channel
/// name and hashtags and appends one sample to each trend series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoRecord {
    // Identity
    pub url: String,

    // Metadata
    pub title: String,
    pub channel_url: String,
    pub channel_name: String,
    pub upload_date: NaiveDateTime,
    pub hashtags: Vec<String>,

    // Latest counters
    pub views: u64,
    pub likes: u64,
    pub dislikes: u64,
    pub comments_count: u64,

    pub integrity_score: IntegrityScore,

    /// Raw stored series; may repeat a timestamp until deduped.
    pub trends: TrendSet,
}

