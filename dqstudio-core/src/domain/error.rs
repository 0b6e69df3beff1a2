// dqstudio-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::rules::RuleIssue;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Invalid rulebook: {} issue(s)\n{}", issues.len(), list_issues(issues))]
    #[diagnostic(
        code(dqstudio::domain::invalid_rulebook),
        help("Fix the listed rule definitions; no rule was evaluated.")
    )]
    InvalidRulebook { issues: Vec<RuleIssue> },

    #[error("Column '{column}' required by rule '{rule}' is not in the dataset")]
    #[diagnostic(
        code(dqstudio::domain::missing_column),
        help("Column names are matched exactly, including case and surrounding spaces.")
    )]
    MissingColumn { column: String, rule: String },

    #[error("Cannot evaluate rule '{rule}' on column '{column}': {reason}")]
    #[diagnostic(code(dqstudio::domain::evaluation))]
    EvaluationSetup {
        column: String,
        rule: String,
        reason: String,
    },

    #[error("Schema Error: {0}")]
    #[diagnostic(code(dqstudio::domain::schema))]
    SchemaError(String),

    #[error("Internal Error: {0}")]
    #[diagnostic(code(dqstudio::domain::internal))]
    InternalError(String),
}

fn list_issues(issues: &[RuleIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("  - {}", issue))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_rulebook_lists_every_issue() {
        let err = DomainError::InvalidRulebook {
            issues: vec![
                RuleIssue {
                    source_row: Some(2),
                    column: "age".into(),
                    rule: "range".into(),
                    reason: "min is not a number".into(),
                },
                RuleIssue {
                    source_row: None,
                    column: "zip".into(),
                    rule: "not_null".into(),
                    reason: "unknown column".into(),
                },
            ],
        };
        insta::assert_snapshot!(err.to_string(), @r"
        Invalid rulebook: 2 issue(s)
          - row 2: column 'age', rule 'range': min is not a number
          - column 'zip', rule 'not_null': unknown column
        ");
    }
}
