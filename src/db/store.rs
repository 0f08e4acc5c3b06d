use std::future::Future;

use anyhow::Result;

use crate::db::models::VideoRecord;
use crate::trend::RecordWrite;

/// Persistence of [`VideoRecord`]s keyed by video URL.
pub trait VideoStore: Send + Sync {
    fn get_video(&self, url: &str) -> impl Future<Output = Result<Option<VideoRecord>>> + Send;

    /// Inserts `record` unless its URL is already stored. Returns whether a
    /// row was written.
    fn put_video(&self, record: &VideoRecord) -> impl Future<Output = Result<bool>> + Send;

    /// Overwrites the mutable columns of an existing row. `channel_url`,
    /// `upload_date` and `integrity_score` are left untouched.
    fn replace_video(&self, record: &VideoRecord) -> impl Future<Output = Result<()>> + Send;

    fn list_video_urls(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn channel_videos(
        &self,
        channel_url: &str,
    ) -> impl Future<Output = Result<Vec<VideoRecord>>> + Send;

    /// Reads the row for `url`, hands it to `apply` and persists the
    /// returned write, all while holding an exclusive per-URL lock. A
    /// concurrent writer for the same URL waits instead of racing the
    /// read-then-write.
    fn record_snapshot<F>(
        &self,
        url: &str,
        apply: F,
    ) -> impl Future<Output = Result<RecordWrite>> + Send
    where
        F: FnOnce(Option<VideoRecord>) -> Result<RecordWrite> + Send;
}
