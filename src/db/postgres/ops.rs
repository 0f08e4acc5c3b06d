use anyhow::{anyhow, Context};
use log::{debug, error};
use tokio_postgres::{types::ToSql, Row};

use crate::db::models::VideoRecord;
use crate::db::postgres::PostgresClient;
use crate::db::VideoStore;
use crate::scoring::IntegrityScore;
use crate::trend::series::{format_timestamp, parse_timestamp};
use crate::trend::{Metric, RecordWrite, TrendSeries, TrendSet};
use crate::utils::{to_count, to_db_int};

const VIDEO_COLUMNS: &str = r#"
    url, title, views, likes, dislikes, channel_url, channel_name,
    comments_count, upload_date, hashtags, integrity_score,
    views_trend, likes_trend, dislikes_trend, comments_trend
"#;

const INSERT_VIDEO: &str = r#"
    INSERT INTO trendwatch.videos (
        url, title, views, likes, dislikes, channel_url, channel_name,
        comments_count, upload_date, hashtags, integrity_score,
        views_trend, likes_trend, dislikes_trend, comments_trend
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
    ON CONFLICT (url) DO NOTHING
"#;

// channel_url, upload_date and integrity_score are creation-only.
const UPDATE_VIDEO: &str = r#"
    UPDATE trendwatch.videos SET
        title = $2,
        views = $3,
        likes = $4,
        dislikes = $5,
        channel_name = $6,
        comments_count = $7,
        hashtags = $8,
        views_trend = $9,
        likes_trend = $10,
        dislikes_trend = $11,
        comments_trend = $12,
        updated_at = NOW()
    WHERE url = $1
"#;

const LOCK_VIDEO: &str = "SELECT pg_advisory_xact_lock(hashtext($1))";

fn select_by(filter: &str) -> String {
    format!("SELECT {} FROM trendwatch.videos WHERE {}", VIDEO_COLUMNS, filter)
}

/// Column values of one `trendwatch.videos` row, ready to bind.
struct VideoRow {
    url: String,
    title: String,
    views: i64,
    likes: i64,
    dislikes: i64,
    channel_url: String,
    channel_name: String,
    comments_count: i64,
    upload_date: String,
    hashtags: String,
    integrity_score: i16,
    views_trend: String,
    likes_trend: String,
    dislikes_trend: String,
    comments_trend: String,
}

impl VideoRow {
    fn from_record(record: &VideoRecord) -> anyhow::Result<Self> {
        Ok(Self {
            url: record.url.clone(),
            title: record.title.clone(),
            views: to_db_int(record.views, "views")?,
            likes: to_db_int(record.likes, "likes")?,
            dislikes: to_db_int(record.dislikes, "dislikes")?,
            channel_url: record.channel_url.clone(),
            channel_name: record.channel_name.clone(),
            comments_count: to_db_int(record.comments_count, "comments_count")?,
            upload_date: format_timestamp(&record.upload_date),
            hashtags: serde_json::to_string(&record.hashtags)?,
            integrity_score: i16::from(record.integrity_score.value()),
            views_trend: record.trends.views.to_json()?,
            likes_trend: record.trends.likes.to_json()?,
            dislikes_trend: record.trends.dislikes.to_json()?,
            comments_trend: record.trends.comments.to_json()?,
        })
    }

    fn insert_params(&self) -> [&(dyn ToSql + Sync); 15] {
        [
            &self.url,
            &self.title,
            &self.views,
            &self.likes,
            &self.dislikes,
            &self.channel_url,
            &self.channel_name,
            &self.comments_count,
            &self.upload_date,
            &self.hashtags,
            &self.integrity_score,
            &self.views_trend,
            &self.likes_trend,
            &self.dislikes_trend,
            &self.comments_trend,
        ]
    }

    fn update_params(&self) -> [&(dyn ToSql + Sync); 12] {
        [
            &self.url,
            &self.title,
            &self.views,
            &self.likes,
            &self.dislikes,
            &self.channel_name,
            &self.comments_count,
            &self.hashtags,
            &self.views_trend,
            &self.likes_trend,
            &self.dislikes_trend,
            &self.comments_trend,
        ]
    }
}

fn trend_column(row: &Row, url: &str, metric: Metric) -> anyhow::Result<TrendSeries> {
    let column = metric.trend_column();
    let raw: String = row.get(column);
    TrendSeries::from_json(&raw)
        .with_context(|| format!("Corrupted {} for video {}", column, url))
}

/// Decodes a stored row. Malformed trend data, hashtags or dates fail the
/// whole read instead of being dropped.
fn row_to_video(row: &Row) -> anyhow::Result<VideoRecord> {
    let url: String = row.get("url");

    let upload_date: String = row.get("upload_date");
    let hashtags: String = row.get("hashtags");
    let integrity_score: i16 = row.get("integrity_score");

    let record = VideoRecord {
        title: row.get("title"),
        channel_url: row.get("channel_url"),
        channel_name: row.get("channel_name"),
        upload_date: parse_timestamp(&upload_date)
            .with_context(|| format!("Corrupted upload_date for video {}", url))?,
        hashtags: serde_json::from_str(&hashtags)
            .with_context(|| format!("Corrupted hashtags for video {}", url))?,
        views: to_count(row.get("views"), "views")?,
        likes: to_count(row.get("likes"), "likes")?,
        dislikes: to_count(row.get("dislikes"), "dislikes")?,
        comments_count: to_count(row.get("comments_count"), "comments_count")?,
        integrity_score: IntegrityScore::new(i64::from(integrity_score))
            .with_context(|| format!("Corrupted integrity_score for video {}", url))?,
        trends: TrendSet {
            views: trend_column(row, &url, Metric::Views)?,
            likes: trend_column(row, &url, Metric::Likes)?,
            dislikes: trend_column(row, &url, Metric::Dislikes)?,
            comments: trend_column(row, &url, Metric::Comments)?,
        },
        url,
    };

    Ok(record)
}

impl VideoStore for PostgresClient {
    async fn get_video(&self, url: &str) -> anyhow::Result<Option<VideoRecord>> {
        let client = self.pool.get().await?;
        let row = client.query_opt(&select_by("url = $1"), &[&url]).await?;
        row.as_ref().map(row_to_video).transpose()
    }

    async fn put_video(&self, record: &VideoRecord) -> anyhow::Result<bool> {
        let row = VideoRow::from_record(record)?;
        let client = self.pool.get().await?;

        let inserted = client
            .execute(INSERT_VIDEO, &row.insert_params())
            .await
            .map_err(|e| {
                error!("Failed to insert video {}: {:?}", record.url, e);
                e
            })?;

        Ok(inserted == 1)
    }

    async fn replace_video(&self, record: &VideoRecord) -> anyhow::Result<()> {
        let row = VideoRow::from_record(record)?;
        let client = self.pool.get().await?;

        let updated = client
            .execute(UPDATE_VIDEO, &row.update_params())
            .await
            .map_err(|e| {
                error!("Failed to update video {}: {:?}", record.url, e);
                e
            })?;

        if updated == 0 {
            return Err(anyhow!("No stored video {} to update", record.url));
        }
        Ok(())
    }

    async fn list_video_urls(&self) -> anyhow::Result<Vec<String>> {
        let client = self.pool.get().await?;
        let rows = client
            .query("SELECT url FROM trendwatch.videos ORDER BY created_at", &[])
            .await?;

        Ok(rows.iter().map(|row| row.get("url")).collect())
    }

    /// Row order is whatever PostgreSQL returns.
    async fn channel_videos(&self, channel_url: &str) -> anyhow::Result<Vec<VideoRecord>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(&select_by("channel_url = $1"), &[&channel_url])
            .await?;

        rows.iter().map(row_to_video).collect()
    }

    async fn record_snapshot<F>(&self, url: &str, apply: F) -> anyhow::Result<RecordWrite>
    where
        F: FnOnce(Option<VideoRecord>) -> anyhow::Result<RecordWrite> + Send,
    {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        // Serializes writers of the same URL until commit/rollback.
        tx.execute(LOCK_VIDEO, &[&url]).await?;

        let existing = tx
            .query_opt(&select_by("url = $1"), &[&url])
            .await?
            .as_ref()
            .map(row_to_video)
            .transpose()?;

        let write = apply(existing)?;
        let row = VideoRow::from_record(write.record())?;

        let affected = match &write {
            RecordWrite::Create(_) => tx.execute(INSERT_VIDEO, &row.insert_params()).await?,
            RecordWrite::Update(_) => tx.execute(UPDATE_VIDEO, &row.update_params()).await?,
        };
        if affected != 1 {
            return Err(anyhow!("Write for video {} affected {} rows", url, affected));
        }

        tx.commit().await?;
        debug!(
            "Recorded snapshot for {} ({})",
            url,
            if write.is_create() { "created" } else { "updated" }
        );

        Ok(write)
    }
}
