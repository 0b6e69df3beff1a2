// dqstudio-core/src/domain/rules/rule.rs

use super::dimension::Dimension;
use super::kind::RuleKind;

/// An atomic check bound to one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub column: String,
    pub kind: RuleKind,
    pub dimension: Dimension,
    pub message: String,
}

impl Rule {
    /// Builds a rule, falling back to the kind's default dimension and a
    /// generated message when the source leaves them blank.
    pub fn new(
        column: impl Into<String>,
        kind: RuleKind,
        dimension: Option<Dimension>,
        message: Option<String>,
    ) -> Self {
        let column = column.into();
        let dimension = dimension.unwrap_or_else(|| kind.default_dimension());
        let message = non_blank(message)
            .unwrap_or_else(|| format!("'{}' failed the {} check", column, kind.label()));
        Self {
            column,
            kind,
            dimension,
            message,
        }
    }
}

/// A duplicate check over the value-tuples of one or more columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinationRule {
    pub columns: Vec<String>,
    pub dimension: Dimension,
    pub message: String,
}

impl CombinationRule {
    pub fn new(
        columns: Vec<String>,
        dimension: Option<Dimension>,
        message: Option<String>,
    ) -> Self {
        let key = combination_key(&columns);
        Self {
            dimension: dimension.unwrap_or(Dimension::Uniqueness),
            message: non_blank(message)
                .unwrap_or_else(|| format!("Duplicate records found on {}", key)),
            columns,
        }
    }

    /// Display key of the combination (`first_name + last_name`).
    pub fn key(&self) -> String {
        combination_key(&self.columns)
    }
}

pub(crate) fn combination_key(columns: &[String]) -> String {
    columns.join(" + ")
}

fn non_blank(message: Option<String>) -> Option<String> {
    message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}
