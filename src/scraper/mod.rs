//! Snapshot source: where raw per-video metrics come from.

use std::future::Future;

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::trend::MetricCounts;

mod http;

pub use http::HttpSnapshotSource;

/// One observation of a video's page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoSnapshot {
    pub url: String,
    pub title: String,
    pub views: u64,
    pub likes: u64,
    pub dislikes: u64,
    pub comments_count: u64,
    pub channel_url: String,
    pub channel_name: String,
    pub upload_date: NaiveDateTime,
    pub hashtags: Vec<String>,
}

impl VideoSnapshot {
    pub fn counts(&self) -> MetricCounts {
        MetricCounts {
            views: self.views,
            likes: self.likes,
            dislikes: self.dislikes,
            comments: self.comments_count,
        }
    }
}

/// Produces snapshots and search results from the video platform.
///
/// Either call may fail; the caller drops that video for the current cycle.
pub trait SnapshotSource: Send + Sync {
    fn fetch_snapshot(&self, video_url: &str) -> impl Future<Output = Result<VideoSnapshot>> + Send;

    /// Video page URLs matching `query`, newest first.
    fn search_videos(&self, query: &str) -> impl Future<Output = Result<Vec<String>>> + Send;
}
