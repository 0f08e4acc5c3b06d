//! Read-side operations behind the dashboard: trends over a date range and
//! integrity-band histograms over the summary rows.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::db::models::{BandCount, BandEngagement, ChannelSummary, VideoSummary};
use crate::db::VideoStore;
use crate::scoring::IntegrityBand;
use crate::trend::{aggregate_channel, TrendSet};

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Yesterday through today (UTC).
    pub fn recent() -> Self {
        let today = Utc::now().date_naive();
        Self {
            start: today - Duration::days(1),
            end: today,
        }
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::recent()
    }
}

/// Deduped trend of one video within `range`, oldest first. `None` if the
/// video is not tracked.
pub async fn video_trend<St: VideoStore>(
    store: &St,
    url: &str,
    range: DateRange,
) -> Result<Option<TrendSet>> {
    let record = store
        .get_video(url)
        .await
        .with_context(|| format!("Failed to load video {}", url))?;

    Ok(record.map(|record| record.trends.deduped().within(range.start, range.end).sorted()))
}

/// Summed trend of every video of a channel within `range`, oldest first.
/// An unknown channel yields four empty series.
pub async fn channel_trend<St: VideoStore>(
    store: &St,
    channel_url: &str,
    range: DateRange,
) -> Result<TrendSet> {
    let records = store
        .channel_videos(channel_url)
        .await
        .with_context(|| format!("Failed to load videos of channel {}", channel_url))?;

    Ok(aggregate_channel(&records).within(range.start, range.end).sorted())
}

/// Number of videos per band, in band order. Empty bands are omitted.
pub fn video_band_histogram(videos: &[VideoSummary]) -> Vec<BandCount> {
    count_bands(
        videos
            .iter()
            .map(|video| Some(IntegrityBand::of_score(video.integrity_score))),
    )
}

/// Number of channels per band of their average score. Channels whose
/// average falls between two bands are counted under `None`, listed last.
pub fn channel_band_histogram(channels: &[ChannelSummary]) -> Vec<BandCount> {
    count_bands(
        channels
            .iter()
            .map(|channel| IntegrityBand::of_average(channel.average_integrity_score)),
    )
}

/// Total views and likes per band, in band order. Empty bands are omitted.
/// Totals saturate at `u64::MAX`.
pub fn band_engagement(videos: &[VideoSummary]) -> Vec<BandEngagement> {
    IntegrityBand::ALL
        .into_iter()
        .filter_map(|band| {
            let mut members = videos
                .iter()
                .filter(|video| IntegrityBand::of_score(video.integrity_score) == band)
                .peekable();
            members.peek()?;

            let (total_views, total_likes) =
                members.fold((0u64, 0u64), |(views, likes), video| {
                    (views.saturating_add(video.views), likes.saturating_add(video.likes))
                });
            Some(BandEngagement {
                band,
                total_views,
                total_likes,
            })
        })
        .collect()
}

fn count_bands(bands: impl Iterator<Item = Option<IntegrityBand>>) -> Vec<BandCount> {
    let mut counts = [0u64; 4];
    let mut unbanded = 0u64;
    for band in bands {
        match band {
            Some(band) => counts[band as usize] += 1,
            None => unbanded += 1,
        }
    }

    let mut histogram: Vec<BandCount> = IntegrityBand::ALL
        .into_iter()
        .zip(counts)
        .filter(|&(_, count)| count > 0)
        .map(|(band, count)| BandCount {
            band: Some(band),
            count,
        })
        .collect();
    if unbanded > 0 {
        histogram.push(BandCount {
            band: None,
            count: unbanded,
        });
    }
    histogram
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::models::VideoRecord;
    use crate::scoring::IntegrityScore;
    use crate::trend::{MetricSample, TrendSeries};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn series(points: &[(u32, u32, u64)]) -> TrendSeries {
        points
            .iter()
            .map(|&(d, h, c)| MetricSample::new(at(d, h), c))
            .collect()
    }

    fn record(url: &str, channel: &str, views: TrendSeries) -> VideoRecord {
        VideoRecord {
            url: url.to_string(),
            title: url.to_string(),
            channel_url: channel.to_string(),
            channel_name: channel.to_string(),
            upload_date: at(1, 0),
            hashtags: vec![],
            views: 0,
            likes: 0,
            dislikes: 0,
            comments_count: 0,
            integrity_score: IntegrityScore::new(40).unwrap(),
            trends: TrendSet {
                views,
                ..TrendSet::default()
            },
        }
    }

    fn summary(score: u8, views: u64, likes: u64) -> VideoSummary {
        VideoSummary {
            title: "t".to_string(),
            upload_date: at(1, 0),
            integrity_score: score,
            url: format!("v{}", score),
            embed_url: String::new(),
            channel_url: "c".to_string(),
            channel_name: "c".to_string(),
            views,
            likes,
            dislikes: 0,
            comments: 0,
            hashtags: vec![],
        }
    }

    fn channel(average: f64) -> ChannelSummary {
        ChannelSummary {
            channel_name: "c".to_string(),
            channel_url: "c".to_string(),
            video_count: 2,
            average_integrity_score: average,
            views: 0,
            likes: 0,
            dislikes: 0,
            comments: 0,
        }
    }

    #[tokio::test]
    async fn test_video_trend_dedups_filters_and_sorts() {
        let store = MemoryStore::with_records(vec![record(
            "v1",
            "c1",
            series(&[(4, 9, 1), (2, 10, 5), (3, 8, 7), (2, 10, 6), (1, 23, 9)]),
        )]);

        let trend = video_trend(&store, "v1", DateRange::new(day(2), day(3)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(trend.views, series(&[(2, 10, 6), (3, 8, 7)]));
        assert!(trend.likes.is_empty());

        let missing = video_trend(&store, "nope", DateRange::new(day(1), day(4)))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_channel_trend_sums_within_range() {
        let store = MemoryStore::with_records(vec![
            record("v1", "c1", series(&[(3, 10, 5), (2, 10, 1)])),
            record("v2", "c1", series(&[(3, 10, 7), (5, 0, 100)])),
            record("v3", "c2", series(&[(3, 10, 1000)])),
        ]);

        let trend = channel_trend(&store, "c1", DateRange::new(day(2), day(3))).await.unwrap();
        assert_eq!(trend.views, series(&[(2, 10, 1), (3, 10, 12)]));

        let unknown = channel_trend(&store, "c9", DateRange::new(day(1), day(9)))
            .await
            .unwrap();
        assert!(unknown.views.is_empty());
    }

    #[test]
    fn test_default_range_is_yesterday_to_today() {
        let range = DateRange::default();
        assert_eq!(range.end - range.start, Duration::days(1));
        assert_eq!(range.end, Utc::now().date_naive());
    }

    #[test]
    fn test_video_histogram_in_band_order() {
        let videos = vec![
            summary(80, 0, 0),
            summary(3, 0, 0),
            summary(25, 0, 0),
            summary(51, 0, 0),
        ];
        let histogram = video_band_histogram(&videos);
        assert_eq!(
            histogram,
            vec![
                BandCount {
                    band: Some(IntegrityBand::Low),
                    count: 2
                },
                BandCount {
                    band: Some(IntegrityBand::MidHigh),
                    count: 1
                },
                BandCount {
                    band: Some(IntegrityBand::High),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_channel_histogram_reports_unbanded_averages() {
        let channels = vec![channel(25.5), channel(30.0), channel(50.0), channel(75.5)];
        let histogram = channel_band_histogram(&channels);
        assert_eq!(
            histogram,
            vec![
                BandCount {
                    band: Some(IntegrityBand::MidLow),
                    count: 2
                },
                BandCount { band: None, count: 2 },
            ]
        );
        assert_eq!(
            serde_json::to_string(&histogram[0]).unwrap(),
            r#"{"band":"26-50","count":2}"#
        );
    }

    #[test]
    fn test_band_engagement_totals() {
        let videos = vec![summary(10, 100, 5), summary(20, 50, 1), summary(90, 7, 7)];
        let engagement = band_engagement(&videos);
        assert_eq!(
            engagement,
            vec![
                BandEngagement {
                    band: IntegrityBand::Low,
                    total_views: 150,
                    total_likes: 6
                },
                BandEngagement {
                    band: IntegrityBand::High,
                    total_views: 7,
                    total_likes: 7
                },
            ]
        );
        assert!(band_engagement(&[]).is_empty());
    }

    #[test]
    fn test_band_engagement_saturates_on_huge_totals() {
        let videos = vec![summary(60, u64::MAX, 1), summary(70, 5, u64::MAX)];
        let engagement = band_engagement(&videos);
        assert_eq!(engagement.len(), 1);
        assert_eq!(engagement[0].total_views, u64::MAX);
        assert_eq!(engagement[0].total_likes, u64::MAX);
    }
}
