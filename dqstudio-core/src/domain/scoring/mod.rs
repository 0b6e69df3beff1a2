// dqstudio-core/src/domain/scoring/mod.rs

pub mod band;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{debug, instrument};

use crate::domain::engine::OutcomeTable;

pub use band::{ColumnTier, QualityBand, TierDistribution};

/// Passed/total evaluation counts behind one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreEntry {
    pub passed: u64,
    pub total: u64,
}

impl ScoreEntry {
    fn record(&mut self, passed: usize, total: usize) {
        self.passed += passed as u64;
        self.total += total as u64;
    }

    /// Full-precision pass rate in [0, 100]. Zero evaluations score 0.0.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64 * 100.0
        }
    }

    /// Pass rate rounded to one decimal place.
    pub fn display(&self) -> f64 {
        round1(self.percentage())
    }
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Scores keyed by column or dimension, in first-seen order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreMap(Vec<(String, ScoreEntry)>);

impl ScoreMap {
    fn entry(&mut self, name: &str) -> &mut ScoreEntry {
        let position = match self.0.iter().position(|(n, _)| n == name) {
            Some(position) => position,
            None => {
                self.0.push((name.to_string(), ScoreEntry::default()));
                self.0.len() - 1
            }
        };
        &mut self.0[position].1
    }

    pub fn get(&self, name: &str) -> Option<&ScoreEntry> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    /// Full-precision percentage for one key.
    pub fn percentage(&self, name: &str) -> Option<f64> {
        self.get(name).map(ScoreEntry::percentage)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScoreEntry)> {
        self.0.iter().map(|(n, e)| (n.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of every entry's counts.
    pub fn totals(&self) -> ScoreEntry {
        self.0.iter().fold(ScoreEntry::default(), |mut acc, (_, e)| {
            acc.passed += e.passed;
            acc.total += e.total;
            acc
        })
    }
}

impl Serialize for ScoreMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, entry) in &self.0 {
            map.serialize_entry(name, &entry.display())?;
        }
        map.end()
    }
}

/// Pure aggregation over an outcome table.
///
/// All three scores read the same boolean columns: the overall totals are
/// exactly the sum of the dimension totals, and the column totals are the
/// same sum restricted to column-bound rules.
pub struct ScoringService;

impl ScoringService {
    /// Pass rate over every evaluation in the table, 0.0 when there is none.
    #[instrument(skip_all)]
    pub fn calculate_overall_score(outcome: &OutcomeTable) -> f64 {
        let (passed, total) = outcome.evaluation_totals();
        let score = ScoreEntry { passed, total }.percentage();
        debug!(score = round1(score), evaluations = total, "Overall score");
        score
    }

    /// Per-column pass rates, in the order of `columns`.
    ///
    /// Columns without any bound rule are left out, and a repeated name is
    /// scored once. Duplicate-detection outcomes belong to a combination, not
    /// a column, and never count here.
    #[instrument(skip_all, fields(columns = columns.len()))]
    pub fn calculate_column_scores<S: AsRef<str>>(
        outcome: &OutcomeTable,
        columns: &[S],
    ) -> ScoreMap {
        let mut scores = ScoreMap::default();
        for column in columns {
            let column = column.as_ref();
            if scores.get(column).is_some() {
                continue;
            }
            for rule in outcome.rules() {
                if rule.target.column() == Some(column) {
                    scores.entry(column).record(rule.passed_count(), rule.total());
                }
            }
        }
        scores
    }

    /// Per-dimension pass rates, in order of first appearance.
    #[instrument(skip_all)]
    pub fn calculate_dimension_scores(outcome: &OutcomeTable) -> ScoreMap {
        let mut scores = ScoreMap::default();
        for rule in outcome.rules() {
            scores
                .entry(rule.dimension.as_str())
                .record(rule.passed_count(), rule.total());
        }
        scores
    }

    /// Share of rows without any failed rule, 0.0 for an empty dataset.
    pub fn calculate_clean_record_rate(outcome: &OutcomeTable) -> f64 {
        ScoreEntry {
            passed: outcome.clean_rows() as u64,
            total: outcome.num_rows() as u64,
        }
        .percentage()
    }
}
