//! Information-integrity scoring.
//!
//! The score is assigned once, when a video is first recorded. Real content
//! analysis does not exist yet; [`RandomScorer`] stands in for it behind the
//! single-method [`IntegrityScorer`] seam.

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("integrity score {0} outside 1..=100")]
pub struct ScoreError(pub i64);

/// Produces a raw score for a newly discovered video.
pub trait IntegrityScorer: Send + Sync {
    fn score(&self) -> u8;
}

/// Placeholder scorer: uniform random value in 1..=100.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomScorer;

impl IntegrityScorer for RandomScorer {
    fn score(&self) -> u8 {
        rand::rng().random_range(MIN_SCORE..=MAX_SCORE)
    }
}

/// A validated score in 1..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct IntegrityScore(u8);

impl IntegrityScore {
    pub fn new(value: i64) -> Result<Self, ScoreError> {
        if (i64::from(MIN_SCORE)..=i64::from(MAX_SCORE)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ScoreError(value))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for IntegrityScore {
    type Error = ScoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IntegrityScore> for i64 {
    fn from(score: IntegrityScore) -> Self {
        i64::from(score.0)
    }
}

/// Quartile buckets used by the histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntegrityBand {
    Low,
    MidLow,
    MidHigh,
    High,
}

impl IntegrityBand {
    pub const ALL: [IntegrityBand; 4] = [
        IntegrityBand::Low,
        IntegrityBand::MidLow,
        IntegrityBand::MidHigh,
        IntegrityBand::High,
    ];

    pub fn of_score(score: u8) -> Self {
        match score {
            0..=25 => IntegrityBand::Low,
            26..=50 => IntegrityBand::MidLow,
            51..=75 => IntegrityBand::MidHigh,
            _ => IntegrityBand::High,
        }
    }

    /// Band of a channel's average score. Bounds are inclusive on both ends,
    /// so an average between two bands (e.g. 25.5) has no band.
    pub fn of_average(average: f64) -> Option<Self> {
        IntegrityBand::ALL.into_iter().find(|band| {
            let (low, high) = band.bounds();
            average >= f64::from(low) && average <= f64::from(high)
        })
    }

    pub fn bounds(&self) -> (u8, u8) {
        match self {
            IntegrityBand::Low => (1, 25),
            IntegrityBand::MidLow => (26, 50),
            IntegrityBand::MidHigh => (51, 75),
            IntegrityBand::High => (76, 100),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IntegrityBand::Low => "1-25",
            IntegrityBand::MidLow => "26-50",
            IntegrityBand::MidHigh => "51-75",
            IntegrityBand::High => "76-100",
        }
    }
}

impl Serialize for IntegrityBand {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
