// dqstudio-core/src/domain/engine/outcome.rs

use datafusion::arrow::array::{Array, ArrayRef, BooleanArray, UInt32Array, UInt64Array};
use datafusion::arrow::datatypes::{DataType, Field, Schema};
use datafusion::arrow::error::ArrowError;
use datafusion::arrow::record_batch::RecordBatch;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::dataset::RowIndex;
use crate::domain::rules::Dimension;
use crate::domain::rules::rule::combination_key;

pub const ROW_INDEX_COLUMN: &str = "row_index";
pub const ISSUE_COUNT_COLUMN: &str = "Count of issues";

/// What a rule column was evaluated against.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTarget {
    Column(String),
    Combination(Vec<String>),
}

impl RuleTarget {
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::Column(name) => Some(name),
            Self::Combination(_) => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Column(name) => name.clone(),
            Self::Combination(columns) => combination_key(columns),
        }
    }
}

/// Pass/fail result of one rule over every row, with enough metadata for the
/// reporting layer to group results without the rulebook.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub label: String,
    pub target: RuleTarget,
    pub kind: String,
    pub dimension: Dimension,
    pub message: String,
    pub passed: BooleanArray,
}

impl RuleOutcome {
    pub fn total(&self) -> usize {
        self.passed.len()
    }

    pub fn passed_count(&self) -> usize {
        self.passed.true_count()
    }

    pub fn failed_count(&self) -> usize {
        self.total() - self.passed_count()
    }

    pub fn passed_at(&self, row: usize) -> bool {
        self.passed.value(row)
    }
}

/// The per-row, per-rule pass/fail matrix of one execution.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeTable {
    row_index: RowIndex,
    rules: Vec<RuleOutcome>,
    issue_counts: Vec<u32>,
}

impl OutcomeTable {
    /// Finalises the table once every rule has been evaluated.
    pub(crate) fn assemble(row_index: RowIndex, rules: Vec<RuleOutcome>) -> Self {
        let mut issue_counts = vec![0u32; row_index.len()];
        for rule in &rules {
            for (row, count) in issue_counts.iter_mut().enumerate() {
                if !rule.passed.value(row) {
                    *count += 1;
                }
            }
        }
        Self {
            row_index,
            rules,
            issue_counts,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.row_index.len()
    }

    pub fn row_index(&self) -> &RowIndex {
        &self.row_index
    }

    pub fn rules(&self) -> &[RuleOutcome] {
        &self.rules
    }

    pub fn rule(&self, label: &str) -> Option<&RuleOutcome> {
        self.rules.iter().find(|r| r.label == label)
    }

    pub fn issue_counts(&self) -> &[u32] {
        &self.issue_counts
    }

    /// Rows with no failed rule.
    pub fn clean_rows(&self) -> usize {
        self.issue_counts.iter().filter(|c| **c == 0).count()
    }

    /// (passed, total) over every evaluation in the table.
    pub fn evaluation_totals(&self) -> (u64, u64) {
        self.rules.iter().fold((0, 0), |(passed, total), r| {
            (passed + r.passed_count() as u64, total + r.total() as u64)
        })
    }

    /// Arrow view handed to the reporting layer: `row_index`, one Boolean
    /// column per rule (metadata: dimension, message, kind, target), then the
    /// issue count.
    pub fn to_record_batch(&self) -> Result<RecordBatch, ArrowError> {
        let mut fields = Vec::with_capacity(self.rules.len() + 2);
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(self.rules.len() + 2);

        fields.push(Field::new(ROW_INDEX_COLUMN, DataType::UInt64, false));
        columns.push(Arc::new(UInt64Array::from(
            self.row_index.positions().to_vec(),
        )));

        for rule in &self.rules {
            let metadata = HashMap::from([
                ("dimension".to_string(), rule.dimension.to_string()),
                ("message".to_string(), rule.message.clone()),
                ("kind".to_string(), rule.kind.clone()),
                ("target".to_string(), rule.target.describe()),
            ]);
            fields.push(Field::new(&rule.label, DataType::Boolean, false).with_metadata(metadata));
            columns.push(Arc::new(rule.passed.clone()));
        }

        fields.push(Field::new(ISSUE_COUNT_COLUMN, DataType::UInt32, false));
        columns.push(Arc::new(UInt32Array::from(self.issue_counts.clone())));

        RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn outcome(label: &str, dimension: Dimension, passed: Vec<bool>) -> RuleOutcome {
        RuleOutcome {
            label: label.into(),
            target: RuleTarget::Column("c".into()),
            kind: "not_null".into(),
            dimension,
            message: "m".into(),
            passed: BooleanArray::from(passed),
        }
    }

    #[test]
    fn test_issue_counts_and_totals() {
        let table = OutcomeTable::assemble(
            RowIndex::sequential(3),
            vec![
                outcome("a", Dimension::Completeness, vec![true, false, true]),
                outcome("b", Dimension::Validation, vec![true, false, false]),
            ],
        );
        assert_eq!(table.issue_counts(), &[0, 2, 1]);
        assert_eq!(table.clean_rows(), 1);
        assert_eq!(table.evaluation_totals(), (3, 6));
    }

    #[test]
    fn test_record_batch_layout() {
        let table = OutcomeTable::assemble(
            RowIndex::sequential(2),
            vec![outcome("c | not_null", Dimension::Completeness, vec![true, false])],
        );
        let batch = table.to_record_batch().unwrap();
        let schema = batch.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec![ROW_INDEX_COLUMN, "c | not_null", ISSUE_COUNT_COLUMN]);
        assert_eq!(
            schema.field(1).metadata().get("dimension").map(String::as_str),
            Some("Completeness")
        );
        assert_eq!(batch.num_rows(), 2);
    }

    #[test]
    fn test_empty_table() {
        let table = OutcomeTable::assemble(RowIndex::sequential(0), vec![]);
        assert_eq!(table.evaluation_totals(), (0, 0));
        assert_eq!(table.to_record_batch().unwrap().num_columns(), 2);
    }
}
