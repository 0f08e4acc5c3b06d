//! In-memory [`VideoStore`] for tests.

use std::sync::Mutex;

use anyhow::{anyhow, Result};

use super::models::VideoRecord;
use super::VideoStore;
use crate::trend::RecordWrite;

/// Rows kept in insertion order; the mutex stands in for the per-URL lock.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<VideoRecord>>,
}

impl MemoryStore {
    pub fn with_records(records: Vec<VideoRecord>) -> Self {
        Self {
            rows: Mutex::new(records),
        }
    }

    fn rows(&self) -> std::sync::MutexGuard<'_, Vec<VideoRecord>> {
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn put(rows: &mut Vec<VideoRecord>, record: &VideoRecord) -> bool {
        if rows.iter().any(|row| row.url == record.url) {
            return false;
        }
        rows.push(record.clone());
        true
    }

    fn replace(rows: &mut [VideoRecord], record: &VideoRecord) -> Result<()> {
        let row = rows
            .iter_mut()
            .find(|row| row.url == record.url)
            .ok_or_else(|| anyhow!("no stored video {}", record.url))?;

        row.title = record.title.clone();
        row.views = record.views;
        row.likes = record.likes;
        row.dislikes = record.dislikes;
        row.comments_count = record.comments_count;
        row.channel_name = record.channel_name.clone();
        row.hashtags = record.hashtags.clone();
        row.trends = record.trends.clone();
        Ok(())
    }
}

impl VideoStore for MemoryStore {
    async fn get_video(&self, url: &str) -> Result<Option<VideoRecord>> {
        Ok(self.rows().iter().find(|row| row.url == url).cloned())
    }

    async fn put_video(&self, record: &VideoRecord) -> Result<bool> {
        Ok(Self::put(&mut self.rows(), record))
    }

    async fn replace_video(&self, record: &VideoRecord) -> Result<()> {
        Self::replace(&mut self.rows(), record)
    }

    async fn list_video_urls(&self) -> Result<Vec<String>> {
        Ok(self.rows().iter().map(|row| row.url.clone()).collect())
    }

    async fn channel_videos(&self, channel_url: &str) -> Result<Vec<VideoRecord>> {
        Ok(self
            .rows()
            .iter()
            .filter(|row| row.channel_url == channel_url)
            .cloned()
            .collect())
    }

    async fn record_snapshot<F>(&self, url: &str, apply: F) -> Result<RecordWrite>
    where
        F: FnOnce(Option<VideoRecord>) -> Result<RecordWrite> + Send,
    {
        let mut rows = self.rows();
        let existing = rows.iter().find(|row| row.url == url).cloned();
        let write = apply(existing)?;
        match &write {
            RecordWrite::Create(record) => {
                Self::put(&mut rows, record);
            },
            RecordWrite::Update(record) => Self::replace(&mut rows, record)?,
        }
        Ok(write)
    }
}
