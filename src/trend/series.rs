use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Utc};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Deserializer, Serialize};

use super::TrendError;

/// Canonical text form of every stored timestamp (`YYYY-MM-DD HH:MM:SS`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, TrendError> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .map_err(|_| TrendError::Timestamp(text.to_string()))
}

/// Drops minutes, seconds and sub-second precision: every scrape within the
/// same UTC hour lands in the same bucket.
pub fn truncate_to_hour(now: DateTime<Utc>) -> NaiveDateTime {
    now.date_naive().and_time(NaiveTime::default()) + TimeDelta::hours(i64::from(now.hour()))
}

mod timestamp_text {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        super::parse_timestamp(&text).map_err(serde::de::Error::custom)
    }
}

/// Largest count a sample may carry: the BIGINT ceiling of the counter columns.
pub const MAX_COUNT: u64 = i64::MAX as u64;

fn bounded_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let count = u64::deserialize(deserializer)?;
    if count > MAX_COUNT {
        return Err(serde::de::Error::custom(format!("count {} exceeds {}", count, MAX_COUNT)));
    }
    Ok(count)
}

/// The four engagement counters tracked for every video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Views,
    Likes,
    Dislikes,
    Comments,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Views, Metric::Likes, Metric::Dislikes, Metric::Comments];

    /// Column holding this metric's serialized series.
    pub fn trend_column(&self) -> &'static str {
        match self {
            Metric::Views => "views_trend",
            Metric::Likes => "likes_trend",
            Metric::Dislikes => "dislikes_trend",
            Metric::Comments => "comments_trend",
        }
    }
}

/// Scalar counter values observed by one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricCounts {
    pub views: u64,
    pub likes: u64,
    pub dislikes: u64,
    pub comments: u64,
}

impl MetricCounts {
    pub fn get(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Views => self.views,
            Metric::Likes => self.likes,
            Metric::Dislikes => self.dislikes,
            Metric::Comments => self.comments,
        }
    }
}

/// One counter value at an hour-truncated instant.
///
/// Stored as `{"t": "2024-03-03 14:00:00", "c": 150}`. Negative, fractional
/// or above-[`MAX_COUNT`] counts are rejected while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSample {
    #[serde(rename = "t", with = "timestamp_text")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "c", deserialize_with = "bounded_count")]
    pub count: u64,
}

impl MetricSample {
    pub fn new(timestamp: NaiveDateTime, count: u64) -> Self {
        Self { timestamp, count }
    }
}

/// Samples of one metric for one video, in the order they were written.
///
/// The stored form may repeat a timestamp (several scrapes in the same
/// hour); [`TrendSeries::deduped`] collapses those for consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrendSeries(Vec<MetricSample>);

impl TrendSeries {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn single(sample: MetricSample) -> Self {
        Self(vec![sample])
    }

    pub fn push(&mut self, sample: MetricSample) {
        self.0.push(sample);
    }

    pub fn samples(&self) -> &[MetricSample] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MetricSample> {
        self.0.iter()
    }

    /// One sample per distinct timestamp, keeping the LAST occurrence.
    ///
    /// Each surviving sample stays at the position of its last occurrence,
    /// so `[{t1,5}, {t2,3}, {t1,9}]` becomes `[{t2,3}, {t1,9}]`. Earlier
    /// same-hour values are overwritten, never summed; summing across
    /// videos is [`crate::trend::aggregate_channel`]'s job.
    pub fn deduped(&self) -> Self {
        let mut seen = FxHashSet::default();
        let mut kept: Vec<MetricSample> = self
            .0
            .iter()
            .rev()
            .filter(|sample| seen.insert(sample.timestamp))
            .copied()
            .collect();
        kept.reverse();
        Self(kept)
    }

    /// Samples whose calendar date falls in `[start, end]`, inclusive.
    pub fn within(&self, start: NaiveDate, end: NaiveDate) -> Self {
        self.0
            .iter()
            .filter(|sample| {
                let day = sample.timestamp.date();
                day >= start && day <= end
            })
            .copied()
            .collect()
    }

    /// Chronological copy; equal timestamps keep their relative order.
    pub fn sorted(&self) -> Self {
        let mut samples = self.0.clone();
        samples.sort_by_key(|sample| sample.timestamp);
        Self(samples)
    }

    pub fn from_json(text: &str) -> Result<Self, TrendError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, TrendError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl FromIterator<MetricSample> for TrendSeries {
    fn from_iter<I: IntoIterator<Item = MetricSample>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TrendSeries {
    type Item = &'a MetricSample;
    type IntoIter = std::slice::Iter<'a, MetricSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<MetricSample>> for TrendSeries {
    fn from(samples: Vec<MetricSample>) -> Self {
        Self(samples)
    }
}

/// The four series of one video (or the summed series of one channel).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSet {
    pub views: TrendSeries,
    pub likes: TrendSeries,
    pub dislikes: TrendSeries,
    pub comments: TrendSeries,
}

impl TrendSet {
    /// First-sight series: one sample per metric.
    pub fn seeded(counts: &MetricCounts, at: NaiveDateTime) -> Self {
        let mut set = Self::default();
        set.append(counts, at);
        set
    }

    pub fn get(&self, metric: Metric) -> &TrendSeries {
        match metric {
            Metric::Views => &self.views,
            Metric::Likes => &self.likes,
            Metric::Dislikes => &self.dislikes,
            Metric::Comments => &self.comments,
        }
    }

    pub fn get_mut(&mut self, metric: Metric) -> &mut TrendSeries {
        match metric {
            Metric::Views => &mut self.views,
            Metric::Likes => &mut self.likes,
            Metric::Dislikes => &mut self.dislikes,
            Metric::Comments => &mut self.comments,
        }
    }

    /// Appends exactly one sample to each of the four series.
    pub fn append(&mut self, counts: &MetricCounts, at: NaiveDateTime) {
        for metric in Metric::ALL {
            self.get_mut(metric)
                .push(MetricSample::new(at, counts.get(metric)));
        }
    }

    pub fn deduped(&self) -> Self {
        self.map(TrendSeries::deduped)
    }

    pub fn within(&self, start: NaiveDate, end: NaiveDate) -> Self {
        self.map(|series| series.within(start, end))
    }

    pub fn sorted(&self) -> Self {
        self.map(TrendSeries::sorted)
    }

    fn map(&self, f: impl Fn(&TrendSeries) -> TrendSeries) -> Self {
        Self {
            views: f(&self.views),
            likes: f(&self.likes),
            dislikes: f(&self.dislikes),
            comments: f(&self.comments),
        }
    }
}
