// dqstudio-core/src/domain/rules/builder.rs

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, instrument, warn};

use crate::domain::error::DomainError;

use super::dimension::Dimension;
use super::document::RulebookDocument;
use super::kind::{RuleKind, is_combination_kind, is_unique_kind};
use super::parameters::{RuleParameters, split_list};
use super::rule::{CombinationRule, Rule};
use super::rulebook::Rulebook;

const COLUMNS_KEYS: &[&str] = &["columns"];

/// One record of a flat (spreadsheet-like) rule description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleRow {
    /// 1-based position of the record in its source, for error reporting.
    pub source_row: usize,
    pub column_name: String,
    pub rule: String,
    pub dimension: String,
    pub message: String,
    /// Any extra field of the record (`min`, `max`, `pattern`, ...).
    pub parameters: RuleParameters,
}

impl RuleRow {
    pub fn new(
        source_row: usize,
        column_name: &str,
        rule: &str,
        dimension: &str,
        message: &str,
    ) -> Self {
        Self {
            source_row,
            column_name: column_name.to_string(),
            rule: rule.to_string(),
            dimension: dimension.to_string(),
            message: message.to_string(),
            parameters: RuleParameters::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.parameters.insert(key, value);
        self
    }
}

/// A rule source entry that prevents the rulebook from being built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleIssue {
    pub source_row: Option<usize>,
    pub column: String,
    pub rule: String,
    pub reason: String,
}

impl fmt::Display for RuleIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(row) = self.source_row {
            write!(f, "row {}: ", row)?;
        }
        write!(f, "column '{}', rule '{}': {}", self.column, self.rule, self.reason)
    }
}

/// A rule source entry that was skipped without failing the build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildWarning {
    pub source_row: Option<usize>,
    pub column: String,
    pub rule: String,
    pub reason: String,
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(row) = self.source_row {
            write!(f, "row {}: ", row)?;
        }
        write!(f, "column '{}', rule '{}' skipped: {}", self.column, self.rule, self.reason)
    }
}

/// A successfully built rulebook together with the entries that were skipped.
#[derive(Debug, Clone)]
pub struct RulebookBuild {
    pub rulebook: Rulebook,
    pub warnings: Vec<BuildWarning>,
}

pub struct RulebookBuilder;

impl RulebookBuilder {
    /// Builds a rulebook from flat rule records.
    ///
    /// Unknown rule kinds are skipped and reported as warnings. Unknown
    /// columns and malformed parameters are collected across the whole source
    /// and returned together; no partial rulebook is ever produced.
    #[instrument(skip_all, fields(rows = rows.len()))]
    pub fn build_from_tabular(
        rows: &[RuleRow],
        known_columns: &[String],
    ) -> Result<RulebookBuild, DomainError> {
        let known: HashSet<&str> = known_columns.iter().map(String::as_str).collect();
        let mut rulebook = Rulebook::new();
        let mut warnings = Vec::new();
        let mut issues = Vec::new();

        for row in rows {
            let issue = |reason: String| RuleIssue {
                source_row: Some(row.source_row),
                column: row.column_name.trim().to_string(),
                rule: row.rule.trim().to_string(),
                reason,
            };

            if row.rule.trim().is_empty() {
                issues.push(issue("rule is blank".into()));
                continue;
            }

            let named_columns = target_columns(row);
            if named_columns.is_empty() {
                issues.push(issue("column_name is blank".into()));
                continue;
            }

            let unknown: Vec<&String> = named_columns
                .iter()
                .filter(|c| !known.contains(c.as_str()))
                .collect();
            for column in &unknown {
                issues.push(RuleIssue {
                    column: (*column).clone(),
                    ..issue("column is not present in the dataset".into())
                });
            }

            let dimension = Dimension::parse(&row.dimension);
            let message = Some(row.message.clone());

            let is_combination = is_combination_kind(&row.rule)
                || (is_unique_kind(&row.rule) && named_columns.len() > 1);
            if is_combination {
                if unknown.is_empty() {
                    debug!(columns = ?named_columns, "Combination rule registered");
                    rulebook.add_combination(CombinationRule::new(
                        named_columns,
                        dimension,
                        message,
                    ));
                }
                continue;
            }

            match RuleKind::resolve(&row.rule, &row.parameters) {
                Ok(Some(kind)) => {
                    if unknown.is_empty() {
                        let column = named_columns[0].as_str();
                        rulebook.add_rule(Rule::new(column, kind, dimension, message));
                    }
                }
                Ok(None) => {
                    warn!(
                        row = row.source_row,
                        rule = %row.rule,
                        "Unrecognized rule kind, skipping"
                    );
                    warnings.push(BuildWarning {
                        source_row: Some(row.source_row),
                        column: row.column_name.trim().to_string(),
                        rule: row.rule.trim().to_string(),
                        reason: "unrecognized rule kind".into(),
                    });
                }
                Err(reason) => issues.push(issue(reason)),
            }
        }

        if !issues.is_empty() {
            return Err(DomainError::InvalidRulebook { issues });
        }

        info!(
            columns = rulebook.columns().len(),
            rules = rulebook.rule_count(),
            skipped = warnings.len(),
            "Rulebook built from tabular source"
        );
        Ok(RulebookBuild { rulebook, warnings })
    }

    /// Loads a rulebook from its structured document form.
    ///
    /// Structured documents are machine-written, so an unknown kind is an
    /// error here rather than a warning.
    #[instrument(skip_all, fields(columns = document.columns.len()))]
    pub fn load_structured(document: &RulebookDocument) -> Result<RulebookBuild, DomainError> {
        let mut rulebook = Rulebook::new();
        let mut issues = Vec::new();

        for (column, specs) in document.columns.iter() {
            for spec in specs {
                let issue = |reason: String| RuleIssue {
                    source_row: None,
                    column: column.to_string(),
                    rule: spec.kind.clone(),
                    reason,
                };
                if column.trim().is_empty() {
                    issues.push(issue("column name is blank".into()));
                    continue;
                }
                match RuleKind::resolve(&spec.kind, &spec.parameters) {
                    Ok(Some(kind)) => rulebook.add_rule(Rule::new(
                        column,
                        kind,
                        spec.dimension.as_deref().and_then(Dimension::parse),
                        spec.message.clone(),
                    )),
                    Ok(None) => issues.push(issue("unrecognized rule kind".into())),
                    Err(reason) => issues.push(issue(reason)),
                }
            }
        }

        for combination in &document.combinations {
            let columns: Vec<String> = combination
                .columns
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
            if columns.is_empty() {
                issues.push(RuleIssue {
                    source_row: None,
                    column: String::new(),
                    rule: "combination".into(),
                    reason: "combination rule names no columns".into(),
                });
                continue;
            }
            rulebook.add_combination(CombinationRule::new(
                columns,
                combination.dimension.as_deref().and_then(Dimension::parse),
                combination.message.clone(),
            ));
        }

        if !issues.is_empty() {
            return Err(DomainError::InvalidRulebook { issues });
        }

        info!(rules = rulebook.rule_count(), "Structured rulebook loaded");
        Ok(RulebookBuild {
            rulebook,
            warnings: Vec::new(),
        })
    }
}

/// Columns named by a row. Combination and uniqueness rules may list several
/// columns in `column_name` or in a `columns` parameter; other kinds always
/// target the single trimmed `column_name`.
fn target_columns(row: &RuleRow) -> Vec<String> {
    let multi = is_combination_kind(&row.rule) || is_unique_kind(&row.rule);
    if !multi {
        let name = row.column_name.trim();
        return if name.is_empty() {
            Vec::new()
        } else {
            vec![name.to_string()]
        };
    }
    if let Some(columns) = row.parameters.list(COLUMNS_KEYS) {
        return columns;
    }
    let raw = row.column_name.replace('+', ",");
    split_list(&raw)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::rules::kind::FormatKind;

    fn known(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tabular_build_preserves_order() {
        let rows = vec![
            RuleRow::new(1, "email", "Not Null", "Completeness", "Email missing"),
            RuleRow::new(2, "age", "range", "", "").with_param("min", "0").with_param("max", "120"),
            RuleRow::new(3, "email", "format:email", "Validation", "Bad email"),
        ];
        let build =
            RulebookBuilder::build_from_tabular(&rows, &known(&["email", "age"])).unwrap();

        let columns: Vec<&str> = build
            .rulebook
            .columns()
            .iter()
            .map(|c| c.column.as_str())
            .collect();
        assert_eq!(columns, vec!["email", "age"]);

        let email = build.rulebook.rules_for("email").unwrap();
        assert_eq!(email[0].kind, RuleKind::NotNull);
        assert_eq!(email[1].kind, RuleKind::Format(FormatKind::Email));

        let age = build.rulebook.rules_for("age").unwrap();
        assert_eq!(age[0].dimension, Dimension::Validation);
        assert!(build.warnings.is_empty());
    }

    #[test]
    fn test_unknown_kind_is_skipped_with_warning() {
        let rows = vec![
            RuleRow::new(1, "email", "telepathy", "Validation", ""),
            RuleRow::new(2, "email", "not_null", "Completeness", ""),
        ];
        let build = RulebookBuilder::build_from_tabular(&rows, &known(&["email"])).unwrap();
        assert_eq!(build.rulebook.rule_count(), 1);
        assert_eq!(build.warnings.len(), 1);
        assert_eq!(build.warnings[0].source_row, Some(1));
        assert_eq!(build.warnings[0].rule, "telepathy");
    }

    #[test]
    fn test_unknown_columns_are_batched() {
        let rows = vec![
            RuleRow::new(1, "emial", "not_null", "", ""),
            RuleRow::new(2, "email", "not_null", "", ""),
            RuleRow::new(3, "phnoe", "format:phone", "", ""),
            RuleRow::new(4, "email", "range", "", ""),
        ];
        let err = RulebookBuilder::build_from_tabular(&rows, &known(&["email", "phone"]))
            .unwrap_err();
        let DomainError::InvalidRulebook { issues } = err else {
            panic!("expected InvalidRulebook");
        };
        let columns: Vec<&str> = issues.iter().map(|i| i.column.as_str()).collect();
        assert_eq!(columns, vec!["emial", "phnoe", "email"]);
        assert_eq!(issues[2].source_row, Some(4));
        assert!(issues[2].reason.contains("bound"));
    }

    #[test]
    fn test_combination_rows() {
        let rows = vec![
            RuleRow::new(1, "first_name + last_name", "duplicate", "", ""),
            RuleRow::new(2, "first_name, dob", "unique", "Uniqueness", "Dup person"),
            RuleRow::new(3, "id", "unique", "", ""),
            RuleRow::new(4, "", "combination", "", "").with_param("columns", "id|dob"),
        ];
        let build = RulebookBuilder::build_from_tabular(
            &rows,
            &known(&["id", "first_name", "last_name", "dob"]),
        )
        .unwrap();

        let combos = build.rulebook.combinations();
        assert_eq!(combos.len(), 3);
        assert_eq!(combos[0].columns, vec!["first_name", "last_name"]);
        assert_eq!(combos[1].message, "Dup person");
        assert_eq!(combos[2].columns, vec!["id", "dob"]);
        assert_eq!(build.rulebook.rules_for("id").unwrap()[0].kind, RuleKind::Unique);
    }

    #[test]
    fn test_single_unique_column_is_bound_to_resolved_name() {
        let rows = vec![
            RuleRow::new(1, "", "unique", "", "").with_param("columns", "id"),
            RuleRow::new(2, "id,", "unique", "", ""),
        ];
        let build = RulebookBuilder::build_from_tabular(&rows, &known(&["id"])).unwrap();

        assert!(build.rulebook.combinations().is_empty());
        assert_eq!(build.rulebook.referenced_columns(), vec!["id"]);
        let rules = build.rulebook.rules_for("id").unwrap();
        assert_eq!(rules.len(), 2);
        assert!(rules.iter().all(|r| r.kind == RuleKind::Unique));
    }

    #[test]
    fn test_structured_rejects_unknown_kind() {
        let yaml = r#"
columns:
  email:
    - kind: not_null
    - kind: telepathy
  age:
    - kind: range
"#;
        let doc: RulebookDocument = serde_yaml::from_str(yaml).unwrap();
        let DomainError::InvalidRulebook { issues } =
            RulebookBuilder::load_structured(&doc).unwrap_err()
        else {
            panic!("expected InvalidRulebook");
        };
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].rule, "telepathy");
        assert_eq!(issues[1].column, "age");
    }

    #[test]
    fn test_tabular_to_document_round_trip() {
        let rows = vec![
            RuleRow::new(1, "code", "pattern", "", "").with_param("pattern", r"[A-Z]{3}"),
            RuleRow::new(2, "status", "allowed_values", "", "")
                .with_param("values", "open|closed")
                .with_param("case_sensitive", "no"),
            RuleRow::new(3, "code, status", "duplicate", "", ""),
            RuleRow::new(4, "when", "standard:date", "Timeliness", "")
                .with_param("date_format", "%d/%m/%Y"),
        ];
        let columns = known(&["code", "status", "when"]);
        let built = RulebookBuilder::build_from_tabular(&rows, &columns).unwrap();

        let document = RulebookDocument::from(&built.rulebook);
        let yaml = serde_yaml::to_string(&document).unwrap();
        let reparsed: RulebookDocument = serde_yaml::from_str(&yaml).unwrap();
        let reloaded = RulebookBuilder::load_structured(&reparsed).unwrap();

        assert_eq!(reloaded.rulebook, built.rulebook);
    }
}
