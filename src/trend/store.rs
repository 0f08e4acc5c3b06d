//! Create-or-append transition applied to a video on every scrape.

use chrono::{DateTime, Utc};

use super::series::{truncate_to_hour, TrendSet};
use crate::db::models::VideoRecord;
use crate::scoring::{IntegrityScore, IntegrityScorer, ScoreError};
use crate::scraper::VideoSnapshot;

/// The single write a scrape produces for one video.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordWrite {
    /// First sight of the URL: insert-if-absent.
    Create(VideoRecord),
    /// Known URL: update keyed by URL.
    Update(VideoRecord),
}

impl RecordWrite {
    pub fn record(&self) -> &VideoRecord {
        match self {
            RecordWrite::Create(record) | RecordWrite::Update(record) => record,
        }
    }

    pub fn into_record(self) -> VideoRecord {
        match self {
            RecordWrite::Create(record) | RecordWrite::Update(record) => record,
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, RecordWrite::Create(_))
    }
}

/// Folds `snapshot`, observed at `now`, into the stored state of its video.
///
/// - `existing == None`: a new record whose four series each hold a single
///   sample, with a score drawn from `scorer`. The scorer is not consulted
///   for known videos.
/// - `existing == Some(_)`: one sample appended to each raw series (no
///   dedup on write). Title, counters, channel name and hashtags are
///   overwritten; channel URL, upload date and score are kept.
pub fn apply_snapshot<S>(
    existing: Option<VideoRecord>,
    snapshot: VideoSnapshot,
    now: DateTime<Utc>,
    scorer: &S,
) -> Result<RecordWrite, ScoreError>
where
    S: IntegrityScorer + ?Sized,
{
    let bucket = truncate_to_hour(now);
    let counts = snapshot.counts();

    match existing {
        None => {
            let integrity_score = IntegrityScore::new(i64::from(scorer.score()))?;
            Ok(RecordWrite::Create(VideoRecord {
                url: snapshot.url,
                title: snapshot.title,
                channel_url: snapshot.channel_url,
                channel_name: snapshot.channel_name,
                upload_date: snapshot.upload_date,
                hashtags: snapshot.hashtags,
                views: counts.views,
                likes: counts.likes,
                dislikes: counts.dislikes,
                comments_count: counts.comments,
                integrity_score,
                trends: TrendSet::seeded(&counts, bucket),
            }))
        },
        Some(mut record) => {
            record.title = snapshot.title;
            record.channel_name = snapshot.channel_name;
            record.hashtags = snapshot.hashtags;
            record.views = counts.views;
            record.likes = counts.likes;
            record.dislikes = counts.dislikes;
            record.comments_count = counts.comments;
            record.trends.append(&counts, bucket);
            Ok(RecordWrite::Update(record))
        },
    }
}
