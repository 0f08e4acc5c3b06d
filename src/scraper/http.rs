use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::debug;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{SnapshotSource, VideoSnapshot};
use crate::config::ScraperSettings;
use crate::utils::{parse_count, parse_upload_date, video_id_from_url};

const VIDEO_PATH: &str = "video";
const COUNTS_PATH: &str = "video/counts";
const SEARCH_PATH: &str = "search/videos";

#[derive(Serialize)]
struct VideoRequest<'a> {
    video_id: &'a str,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    offset: u32,
    limit: u32,
    sensitivity_id: &'a str,
    sort: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiChannel {
    channel_id: String,
    #[serde(default)]
    channel_name: String,
}

/// Hashtags come back either as bare strings or as small objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiHashtag {
    Plain(String),
    Tagged {
        #[serde(alias = "hashtag_id", alias = "name")]
        text: String,
    },
}

impl ApiHashtag {
    fn into_text(self) -> String {
        match self {
            ApiHashtag::Plain(text) | ApiHashtag::Tagged { text } => text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiVideo {
    #[serde(default)]
    video_name: String,
    #[serde(default)]
    publish_date: Option<String>,
    channel: ApiChannel,
    #[serde(default)]
    hashtags: Vec<ApiHashtag>,
}

/// Counters arrive as numbers or as display strings; blanks mean zero.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiCount {
    Number(u64),
    Text(String),
}

impl ApiCount {
    fn value(&self, field: &str) -> Result<u64> {
        match self {
            ApiCount::Number(n) => Ok(*n),
            ApiCount::Text(text) => {
                parse_count(text).ok_or_else(|| anyhow!("unparseable {} {:?}", field, text))
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiCounts {
    view_count: Option<ApiCount>,
    like_count: Option<ApiCount>,
    dislike_count: Option<ApiCount>,
    comment_count: Option<ApiCount>,
}

fn count_or_zero(count: &Option<ApiCount>, field: &str) -> Result<u64> {
    count.as_ref().map_or(Ok(0), |c| c.value(field))
}

#[derive(Debug, Deserialize)]
struct ApiSearchHit {
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct ApiSearchResults {
    #[serde(default)]
    videos: Vec<ApiSearchHit>,
}

/// Snapshot source backed by the platform's public JSON API.
#[derive(Clone)]
pub struct HttpSnapshotSource {
    client: Client,
    api_url: String,
    site_url: String,
    search_limit: u32,
    request_delay: Duration,
}

impl HttpSnapshotSource {
    pub fn new(settings: &ScraperSettings, search_limit: u32) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            site_url: settings.site_url.trim_end_matches('/').to_string(),
            search_limit,
            request_delay: Duration::from_millis(settings.request_delay_ms),
        })
    }

    fn video_url(&self, video_id: &str) -> String {
        format!("{}/video/{}/", self.site_url, video_id)
    }

    fn channel_url(&self, channel_id: &str) -> String {
        format!("{}/channel/{}/", self.site_url, channel_id)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let endpoint = format!("{}/{}", self.api_url, path);
        debug!("POST {}", endpoint);

        // Keep the request rate close to a person clicking through pages.
        tokio::time::sleep(self.request_delay).await;

        let response = self
            .client
            .post(&endpoint)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", endpoint))?
            .error_for_status()
            .with_context(|| format!("{} returned an error status", endpoint))?;

        response
            .json()
            .await
            .with_context(|| format!("Unexpected response body from {}", endpoint))
    }
}

impl SnapshotSource for HttpSnapshotSource {
    async fn fetch_snapshot(&self, video_url: &str) -> Result<VideoSnapshot> {
        let video_id = video_id_from_url(video_url)
            .ok_or_else(|| anyhow!("No video id in URL {}", video_url))?;
        let request = VideoRequest {
            video_id: &video_id,
        };

        let video: ApiVideo = self.post(VIDEO_PATH, &request).await?;
        let counts: ApiCounts = self.post(COUNTS_PATH, &request).await?;

        let publish_date = video
            .publish_date
            .as_deref()
            .ok_or_else(|| anyhow!("No publish date for {}", video_url))?;
        let upload_date = parse_upload_date(publish_date).ok_or_else(|| {
            anyhow!("Unparseable publish date {:?} for {}", publish_date, video_url)
        })?;

        Ok(VideoSnapshot {
            url: video_url.to_string(),
            title: video.video_name,
            views: count_or_zero(&counts.view_count, "view_count")?,
            likes: count_or_zero(&counts.like_count, "like_count")?,
            dislikes: count_or_zero(&counts.dislike_count, "dislike_count")?,
            comments_count: count_or_zero(&counts.comment_count, "comment_count")?,
            channel_url: self.channel_url(&video.channel.channel_id),
            channel_name: video.channel.channel_name,
            upload_date,
            hashtags: video.hashtags.into_iter().map(ApiHashtag::into_text).collect(),
        })
    }

    async fn search_videos(&self, query: &str) -> Result<Vec<String>> {
        let request = SearchRequest {
            query,
            offset: 0,
            limit: self.search_limit,
            sensitivity_id: "normal",
            sort: "new",
        };

        let results: ApiSearchResults = self.post(SEARCH_PATH, &request).await?;

        Ok(results
            .videos
            .into_iter()
            .map(|hit| self.video_url(&hit.video_id))
            .collect())
    }
}
