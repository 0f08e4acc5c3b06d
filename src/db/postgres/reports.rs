use anyhow::Context;

use crate::db::models::{ChannelSummary, VideoSummary};
use crate::db::postgres::PostgresClient;
use crate::trend::series::parse_timestamp;
use crate::utils::{embed_url, to_count};

// Case-insensitive substring match on the title; '' matches everything.
const TITLE_FILTER: &str = "strpos(lower(title), lower($1)) > 0";

impl PostgresClient {
    /// Latest counters of every video whose title contains `title_query`.
    pub async fn video_summaries(&self, title_query: &str) -> anyhow::Result<Vec<VideoSummary>> {
        let client = self.pool.get().await?;
        let query = format!(
            r#"
            SELECT
                title, upload_date, integrity_score, url, channel_url, channel_name,
                views, likes, dislikes, comments_count, hashtags
            FROM trendwatch.videos
            WHERE {}
            ORDER BY created_at
            "#,
            TITLE_FILTER
        );

        let rows = client.query(&query, &[&title_query]).await?;
        rows.iter()
            .map(|row| -> anyhow::Result<VideoSummary> {
                let url: String = row.get("url");
                let upload_date: String = row.get("upload_date");
                let hashtags: String = row.get("hashtags");
                let integrity_score: i16 = row.get("integrity_score");

                Ok(VideoSummary {
                    title: row.get("title"),
                    upload_date: parse_timestamp(&upload_date)
                        .with_context(|| format!("Corrupted upload_date for video {}", url))?,
                    integrity_score: u8::try_from(integrity_score)
                        .with_context(|| format!("Corrupted integrity_score for video {}", url))?,
                    channel_url: row.get("channel_url"),
                    channel_name: row.get("channel_name"),
                    views: to_count(row.get("views"), "views")?,
                    likes: to_count(row.get("likes"), "likes")?,
                    dislikes: to_count(row.get("dislikes"), "dislikes")?,
                    comments: to_count(row.get("comments_count"), "comments_count")?,
                    hashtags: serde_json::from_str(&hashtags)
                        .with_context(|| format!("Corrupted hashtags for video {}", url))?,
                    embed_url: embed_url(&url),
                    url,
                })
            })
            .collect()
    }

    /// Totals per (channel name, channel URL) over the matching videos.
    pub async fn channel_summaries(
        &self,
        title_query: &str,
    ) -> anyhow::Result<Vec<ChannelSummary>> {
        let client = self.pool.get().await?;
        let query = format!(
            r#"
            SELECT
                channel_name,
                channel_url,
                COUNT(*)::BIGINT AS video_count,
                AVG(integrity_score)::FLOAT8 AS average_integrity_score,
                SUM(views)::BIGINT AS views,
                SUM(likes)::BIGINT AS likes,
                SUM(dislikes)::BIGINT AS dislikes,
                SUM(comments_count)::BIGINT AS comments
            FROM trendwatch.videos
            WHERE {}
            GROUP BY channel_name, channel_url
            ORDER BY channel_name, channel_url
            "#,
            TITLE_FILTER
        );

        let rows = client.query(&query, &[&title_query]).await?;
        rows.iter()
            .map(|row| -> anyhow::Result<ChannelSummary> {
                Ok(ChannelSummary {
                    channel_name: row.get("channel_name"),
                    channel_url: row.get("channel_url"),
                    video_count: to_count(row.get("video_count"), "video_count")?,
                    average_integrity_score: row.get("average_integrity_score"),
                    views: to_count(row.get("views"), "views")?,
                    likes: to_count(row.get("likes"), "likes")?,
                    dislikes: to_count(row.get("dislikes"), "dislikes")?,
                    comments: to_count(row.get("comments"), "comments")?,
                })
            })
            .collect()
    }
}
