//! Channel-level roll-up of per-video trend series.

use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;

use super::series::{Metric, MetricSample, TrendSeries, TrendSet};
use crate::db::models::VideoRecord;

/// Sums the trend series of every video of a channel.
///
/// 1. Each video's series are deduped first (keep-last within the video).
/// 2. The deduped series are concatenated in the order `records` is given.
/// 3. Samples sharing an exact timestamp are SUMMED across videos.
///
/// Totals saturate at `u64::MAX` instead of wrapping.
///
/// Output order is first appearance of each timestamp in the concatenation,
/// not chronological; call [`TrendSet::sorted`] when time order matters.
/// No records yields four empty series.
pub fn aggregate_channel(records: &[VideoRecord]) -> TrendSet {
    let deduped: Vec<TrendSet> = records
        .iter()
        .map(|record| record.trends.deduped())
        .collect();

    let mut result = TrendSet::default();
    for metric in Metric::ALL {
        *result.get_mut(metric) = sum_by_timestamp(deduped.iter().map(|set| set.get(metric)));
    }
    result
}

fn sum_by_timestamp<'a>(series: impl Iterator<Item = &'a TrendSeries>) -> TrendSeries {
    let mut positions: FxHashMap<NaiveDateTime, usize> = FxHashMap::default();
    let mut totals: Vec<MetricSample> = Vec::new();

    for sample in series.flat_map(TrendSeries::iter) {
        match positions.get(&sample.timestamp) {
            Some(&index) => {
                let total = &mut totals[index].count;
                *total = total.saturating_add(sample.count);
            },
            None => {
                positions.insert(sample.timestamp, totals.len());
                totals.push(*sample);
            },
        }
    }

    totals.into()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::scoring::IntegrityScore;

    fn hour(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 3)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn series(points: &[(u32, u64)]) -> TrendSeries {
        points
            .iter()
            .map(|&(h, c)| MetricSample::new(hour(h), c))
            .collect()
    }

    fn video(url: &str, views: &[(u32, u64)], likes: &[(u32, u64)]) -> VideoRecord {
        VideoRecord {
            url: url.to_string(),
            title: url.to_string(),
            channel_url: "https://www.bitchute.com/channel/c1/".to_string(),
            channel_name: "Channel One".to_string(),
            upload_date: hour(0),
            hashtags: vec![],
            views: 0,
            likes: 0,
            dislikes: 0,
            comments_count: 0,
            integrity_score: IntegrityScore::new(50).unwrap(),
            trends: TrendSet {
                views: series(views),
                likes: series(likes),
                dislikes: TrendSeries::new(),
                comments: TrendSeries::new(),
            },
        }
    }

    #[test]
    fn test_sums_across_videos_per_timestamp() {
        let records = vec![
            video("v1", &[(1, 5)], &[]),
            video("v2", &[(1, 7)], &[]),
        ];
        assert_eq!(aggregate_channel(&records).views, series(&[(1, 12)]));
    }

    #[test]
    fn test_zero_videos_yields_empty_series() {
        let result = aggregate_channel(&[]);
        for metric in Metric::ALL {
            assert!(result.get(metric).is_empty());
        }
    }

    #[test]
    fn test_dedup_within_video_then_sum_across_videos() {
        // v1 was scraped twice in hour 1: only its last value (9) counts.
        let records = vec![
            video("v1", &[(1, 5), (2, 3), (1, 9)], &[(1, 1)]),
            video("v2", &[(1, 7), (3, 4)], &[(1, 2), (1, 6)]),
        ];
        let result = aggregate_channel(&records);

        assert_eq!(result.views, series(&[(2, 3), (1, 16), (3, 4)]));
        assert_eq!(result.likes, series(&[(1, 7)]));
        assert!(result.dislikes.is_empty());
    }

    #[test]
    fn test_order_is_first_appearance_not_chronological() {
        let records = vec![
            video("v1", &[(5, 1), (2, 1)], &[]),
            video("v2", &[(1, 1), (5, 1)], &[]),
        ];
        let result = aggregate_channel(&records);

        assert_eq!(result.views, series(&[(5, 2), (2, 1), (1, 1)]));
        assert_eq!(result.sorted().views, series(&[(1, 1), (2, 1), (5, 2)]));
    }

    #[test]
    fn test_large_counts_saturate_instead_of_overflowing() {
        let big = crate::trend::series::MAX_COUNT;
        let records = vec![
            video("v1", &[(1, big)], &[]),
            video("v2", &[(1, big)], &[]),
            video("v3", &[(1, big), (2, 1)], &[]),
        ];
        let result = aggregate_channel(&records);
        assert_eq!(result.views, series(&[(1, u64::MAX), (2, 1)]));
    }

    #[test]
    fn test_distinct_timestamps_are_never_merged() {
        let off_hour = NaiveDate::from_ymd_opt(2024, 3, 3)
            .unwrap()
            .and_hms_opt(1, 30, 0)
            .unwrap();
        let mut v2 = video("v2", &[], &[]);
        v2.trends.views = vec![MetricSample::new(off_hour, 7)].into();

        let result = aggregate_channel(&[video("v1", &[(1, 5)], &[]), v2]);
        assert_eq!(result.views.len(), 2);
    }
}
