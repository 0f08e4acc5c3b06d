use chrono::NaiveDateTime;
use serde::Serialize;

use crate::scoring::IntegrityBand;

/// Row of the video table: latest counters without trend data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoSummary {
    pub title: String,
    pub upload_date: NaiveDateTime,
    pub integrity_score: u8,
    pub url: String,
    /// Player URL for embedding the video.
    pub embed_url: String,
    pub channel_url: String,
    pub channel_name: String,
    pub views: u64,
    pub likes: u64,
    pub dislikes: u64,
    pub comments: u64,
    pub hashtags: Vec<String>,
}

/// Per-channel totals across its tracked videos.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSummary {
    pub channel_name: String,
    pub channel_url: String,
    pub video_count: u64,
    pub average_integrity_score: f64,
    pub views: u64,
    pub likes: u64,
    pub dislikes: u64,
    pub comments: u64,
}

/// Histogram bucket. `band` is `None` for channel averages that fall
/// between two bands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandCount {
    pub band: Option<IntegrityBand>,
    pub count: u64,
}

/// Engagement totals of all videos in one integrity band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandEngagement {
    pub band: IntegrityBand,
    pub total_views: u64,
    pub total_likes: u64,
}
