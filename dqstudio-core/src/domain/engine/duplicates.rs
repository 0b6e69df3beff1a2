// dqstudio-core/src/domain/engine/duplicates.rs

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::domain::dataset::{BlankPolicy, Dataset, TextColumn};
use crate::domain::error::DomainError;
use crate::domain::rules::Rulebook;
use crate::domain::rules::rule::combination_key;

/// Duplicate groups found for one combination rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinationDuplicates {
    pub key: String,
    pub columns: Vec<String>,
    /// Row-index values sharing an identical key, ordered by first row.
    pub groups: Vec<Vec<u64>>,
}

impl CombinationDuplicates {
    pub fn duplicate_rows(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }
}

/// Groups rows by the value-tuple of a column combination.
///
/// Rows with a missing value in any column of the combination never take
/// part in a group: a missing key cannot establish duplication.
#[derive(Debug, Clone, Default)]
pub struct DuplicateDetector {
    blanks: BlankPolicy,
}

impl DuplicateDetector {
    pub fn new(blanks: BlankPolicy) -> Self {
        Self { blanks }
    }

    /// Positional groups (size > 1) for one combination, ordered by first row.
    pub fn group_rows(
        &self,
        dataset: &Dataset,
        columns: &[String],
    ) -> Result<Vec<Vec<usize>>, DomainError> {
        let texts = columns
            .iter()
            .map(|name| {
                let array = dataset.column(name).ok_or_else(|| DomainError::MissingColumn {
                    column: name.clone(),
                    rule: format!("duplicate check on {}", combination_key(columns)),
                })?;
                TextColumn::from_array(array, &self.blanks).map_err(|e| {
                    DomainError::EvaluationSetup {
                        column: name.clone(),
                        rule: "duplicate".into(),
                        reason: e.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut buckets: HashMap<Vec<&str>, Vec<usize>> = HashMap::new();
        for row in 0..dataset.num_rows() {
            let key: Option<Vec<&str>> = texts.iter().map(|t| t.value(row)).collect();
            if let Some(key) = key {
                buckets.entry(key).or_default().push(row);
            }
        }

        let mut groups: Vec<Vec<usize>> = buckets.into_values().filter(|g| g.len() > 1).collect();
        groups.sort_unstable_by_key(|g| g[0]);
        Ok(groups)
    }

    /// Per-row duplicate flag (`true` = row belongs to a group of size > 1).
    pub fn flag_rows(groups: &[Vec<usize>], num_rows: usize) -> Vec<bool> {
        let mut flags = vec![false; num_rows];
        for row in groups.iter().flatten() {
            flags[*row] = true;
        }
        flags
    }

    #[instrument(skip_all, fields(combinations = rulebook.combinations().len()))]
    pub fn get_combination_duplicates(
        &self,
        dataset: &Dataset,
        rulebook: &Rulebook,
    ) -> Result<Vec<CombinationDuplicates>, DomainError> {
        let positions = dataset.row_index().positions();
        rulebook
            .combinations()
            .iter()
            .map(|combination| {
                let groups = self.group_rows(dataset, &combination.columns)?;
                debug!(
                    key = %combination.key(),
                    groups = groups.len(),
                    "Duplicate groups detected"
                );
                Ok(CombinationDuplicates {
                    key: combination.key(),
                    columns: combination.columns.clone(),
                    groups: groups
                        .into_iter()
                        .map(|g| g.into_iter().map(|row| positions[row]).collect())
                        .collect(),
                })
            })
            .collect()
    }
}

/// Duplicate groups of every combination rule, with the default blank policy.
pub fn get_combination_duplicates(
    dataset: &Dataset,
    rulebook: &Rulebook,
) -> Result<Vec<CombinationDuplicates>, DomainError> {
    DuplicateDetector::default().get_combination_duplicates(dataset, rulebook)
}
