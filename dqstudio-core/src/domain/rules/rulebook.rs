// dqstudio-core/src/domain/rules/rulebook.rs

use crate::domain::error::DomainError;

use super::rule::{CombinationRule, Rule};

/// Rules bound to one column, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRules {
    pub column: String,
    pub rules: Vec<Rule>,
}

/// Ordered collection of every rule applicable to a dataset.
///
/// Columns keep the order of their first appearance in the rule source and
/// rules keep their input order within a column. Execution and reporting
/// both follow this order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rulebook {
    columns: Vec<ColumnRules>,
    combinations: Vec<CombinationRule>,
}

impl Rulebook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, rule: Rule) {
        match self.columns.iter_mut().find(|c| c.column == rule.column) {
            Some(entry) => entry.rules.push(rule),
            None => self.columns.push(ColumnRules {
                column: rule.column.clone(),
                rules: vec![rule],
            }),
        }
    }

    pub fn add_combination(&mut self, rule: CombinationRule) {
        self.combinations.push(rule);
    }

    pub fn columns(&self) -> &[ColumnRules] {
        &self.columns
    }

    pub fn combinations(&self) -> &[CombinationRule] {
        &self.combinations
    }

    pub fn rules_for(&self, column: &str) -> Option<&[Rule]> {
        self.columns
            .iter()
            .find(|c| c.column == column)
            .map(|c| c.rules.as_slice())
    }

    /// All column rules, flattened in execution order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.columns.iter().flat_map(|c| c.rules.iter())
    }

    /// Number of rule columns an execution produces (column rules plus
    /// combination rules).
    pub fn rule_count(&self) -> usize {
        self.rules().count() + self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rule_count() == 0
    }

    /// Every column name referenced by a rule, deduplicated, in first-use order.
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        let names = self
            .columns
            .iter()
            .map(|c| c.column.as_str())
            .chain(self.combinations.iter().flat_map(|c| c.columns.iter().map(String::as_str)));
        for name in names {
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen
    }

    /// Fails with the first missing column, naming the rule that needs it.
    pub fn ensure_columns_exist<F>(&self, has_column: F) -> Result<(), DomainError>
    where
        F: Fn(&str) -> bool,
    {
        for entry in &self.columns {
            if !has_column(&entry.column) {
                let rule = entry
                    .rules
                    .first()
                    .map(|r| r.kind.label())
                    .unwrap_or_default();
                return Err(DomainError::MissingColumn {
                    column: entry.column.clone(),
                    rule,
                });
            }
        }
        for combination in &self.combinations {
            if let Some(missing) = combination.columns.iter().find(|c| !has_column(c.as_str())) {
                return Err(DomainError::MissingColumn {
                    column: missing.clone(),
                    rule: format!("duplicate check on {}", combination.key()),
                });
            }
        }
        Ok(())
    }
}
