// dqstudio-core/src/application/report.rs

use serde::Serialize;

use crate::domain::engine::{CombinationDuplicates, OutcomeTable};
use crate::domain::rules::{BuildWarning, Rulebook};
use crate::domain::scoring::{QualityBand, ScoreMap, ScoringService, TierDistribution, round1};

const WORST_COLUMNS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnScoreLine {
    pub column: String,
    pub score: f64,
    pub failed: u64,
}

/// Scorecard of one run, the shape handed to reporting and to the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReport {
    pub name: String,
    pub records_analysed: usize,
    pub rules_executed: usize,
    pub columns_scored: usize,
    pub overall_score: f64,
    pub band: QualityBand,
    pub clean_record_rate: f64,
    pub dimension_scores: ScoreMap,
    pub column_scores: ScoreMap,
    pub tiers: TierDistribution,
    pub worst_columns: Vec<ColumnScoreLine>,
    pub duplicates: Vec<CombinationDuplicates>,
    pub warnings: Vec<BuildWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_under: Option<f64>,
    /// Full-precision overall score, used for the threshold check.
    #[serde(skip)]
    overall_exact: f64,
}

impl AssessmentReport {
    pub fn build(
        name: &str,
        rulebook: &Rulebook,
        outcome: &OutcomeTable,
        duplicates: Vec<CombinationDuplicates>,
        warnings: Vec<BuildWarning>,
    ) -> Self {
        let overall = ScoringService::calculate_overall_score(outcome);
        let columns = rulebook.referenced_columns();
        let column_scores = ScoringService::calculate_column_scores(outcome, &columns);
        let dimension_scores = ScoringService::calculate_dimension_scores(outcome);

        let mut worst_columns: Vec<ColumnScoreLine> = column_scores
            .iter()
            .map(|(column, entry)| ColumnScoreLine {
                column: column.to_string(),
                score: entry.display(),
                failed: entry.total - entry.passed,
            })
            .collect();
        // Stable sort: ties keep rulebook order.
        worst_columns.sort_by(|a, b| a.score.total_cmp(&b.score));
        worst_columns.truncate(WORST_COLUMNS);

        Self {
            name: name.to_string(),
            records_analysed: outcome.num_rows(),
            rules_executed: outcome.rules().len(),
            columns_scored: column_scores.len(),
            overall_score: round1(overall),
            band: QualityBand::from_score(overall),
            clean_record_rate: round1(ScoringService::calculate_clean_record_rate(outcome)),
            tiers: TierDistribution::from_scores(&column_scores),
            dimension_scores,
            column_scores,
            worst_columns,
            duplicates,
            warnings,
            fail_under: None,
            overall_exact: overall,
        }
    }

    pub fn with_threshold(mut self, fail_under: Option<f64>) -> Self {
        self.fail_under = fail_under;
        self
    }

    /// False only when a threshold is set and the overall score is under it.
    pub fn meets_threshold(&self) -> bool {
        self.fail_under.is_none_or(|t| self.overall_exact >= t)
    }
}
