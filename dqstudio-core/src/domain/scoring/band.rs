// dqstudio-core/src/domain/scoring/band.rs

use serde::Serialize;
use std::fmt;

use super::ScoreMap;

/// Qualitative reading of a percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityBand {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Excellent
        } else if score >= 60.0 {
            Self::Good
        } else if score >= 40.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

impl fmt::Display for QualityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnTier {
    High,
    Medium,
    Low,
}

impl ColumnTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::High
        } else if score >= 60.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// How many scored columns fall in each tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TierDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl TierDistribution {
    pub fn from_scores(columns: &ScoreMap) -> Self {
        columns
            .iter()
            .fold(Self::default(), |mut acc, (_, entry)| {
                match ColumnTier::from_score(entry.percentage()) {
                    ColumnTier::High => acc.high += 1,
                    ColumnTier::Medium => acc.medium += 1,
                    ColumnTier::Low => acc.low += 1,
                }
                acc
            })
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }

    /// Share of columns in a tier, as a percentage.
    pub fn share(&self, tier: ColumnTier) -> f64 {
        let count = match tier {
            ColumnTier::High => self.high,
            ColumnTier::Medium => self.medium,
            ColumnTier::Low => self.low,
        };
        if self.total() == 0 {
            0.0
        } else {
            count as f64 / self.total() as f64 * 100.0
        }
    }
}
