// dqstudio-core/src/domain/engine/executor.rs

use chrono::format::StrftimeItems;
use datafusion::arrow::array::{ArrayRef, BooleanArray};
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

use crate::domain::dataset::coerce::{parse_number, to_date, to_number};
use crate::domain::dataset::{BlankPolicy, Dataset, TextColumn};
use crate::domain::error::DomainError;
use crate::domain::rules::{FormatKind, Rule, RuleKind, Rulebook, StandardKind};

use super::duplicates::DuplicateDetector;
use super::outcome::{OutcomeTable, RuleOutcome, RuleTarget};

/// Built-in format patterns, compiled once per execution.
struct FormatMatchers {
    email: Regex,
    phone: Regex,
    url: Regex,
}

impl FormatMatchers {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            email: Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")?,
            phone: Regex::new(r"^\+?[0-9(][0-9\s().-]*[0-9]$")?,
            url: Regex::new(r"(?i)^(https?|ftp)://[^\s/$.?#][^\s]*$")?,
        })
    }
}

/// Lazily computed views of one column, shared by all its rules.
struct ColumnView<'a> {
    array: &'a ArrayRef,
    text: TextColumn,
    numbers: Option<Vec<Option<f64>>>,
}

impl ColumnView<'_> {
    fn numbers(&mut self, rule: &str) -> Result<&[Option<f64>], DomainError> {
        if self.numbers.is_none() {
            let numbers = to_number(self.array, &self.text).map_err(|e| {
                DomainError::EvaluationSetup {
                    column: String::new(),
                    rule: rule.to_string(),
                    reason: e.to_string(),
                }
            })?;
            self.numbers = Some(numbers);
        }
        Ok(self.numbers.as_deref().unwrap_or(&[]))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    pub blanks: BlankPolicy,
}

/// Evaluates a rulebook against a dataset.
///
/// Each rule is evaluated as one pass over its whole column. Rules never
/// read each other's outcomes, so the order of evaluation does not change
/// the result; the issue tally is computed only after every rule has run.
#[derive(Debug, Clone, Default)]
pub struct RuleExecutor {
    options: ExecutionOptions,
}

impl RuleExecutor {
    pub fn new(options: ExecutionOptions) -> Self {
        Self { options }
    }

    #[instrument(skip_all, fields(rows = dataset.num_rows(), rules = rulebook.rule_count()))]
    pub fn execute_all_rules(
        &self,
        dataset: &Dataset,
        rulebook: &Rulebook,
    ) -> Result<OutcomeTable, DomainError> {
        rulebook.ensure_columns_exist(|c| dataset.has_column(c))?;

        let matchers = FormatMatchers::new()
            .map_err(|e| DomainError::InternalError(format!("Built-in format pattern: {}", e)))?;
        let mut outcomes = Vec::with_capacity(rulebook.rule_count());

        for entry in rulebook.columns() {
            let array = dataset.column(&entry.column).ok_or_else(|| DomainError::MissingColumn {
                column: entry.column.clone(),
                rule: String::new(),
            })?;
            let text = TextColumn::from_array(array, &self.options.blanks).map_err(|e| {
                DomainError::EvaluationSetup {
                    column: entry.column.clone(),
                    rule: "text coercion".into(),
                    reason: e.to_string(),
                }
            })?;
            let mut view = ColumnView {
                array,
                text,
                numbers: None,
            };

            let mut labels: Vec<String> = Vec::new();
            for rule in &entry.rules {
                let passed = evaluate(rule, &mut view, &matchers).map_err(|e| match e {
                    DomainError::EvaluationSetup { rule, reason, .. } => {
                        DomainError::EvaluationSetup {
                            column: entry.column.clone(),
                            rule,
                            reason,
                        }
                    }
                    other => other,
                })?;
                let label = unique_label(
                    &mut labels,
                    format!("{} | {}", entry.column, rule.kind.label()),
                );
                debug!(
                    label = %label,
                    failed = passed.iter().filter(|p| !**p).count(),
                    "Rule evaluated"
                );
                outcomes.push(RuleOutcome {
                    label,
                    target: RuleTarget::Column(entry.column.clone()),
                    kind: rule.kind.label(),
                    dimension: rule.dimension.clone(),
                    message: rule.message.clone(),
                    passed: BooleanArray::from(passed),
                });
            }
        }

        let detector = DuplicateDetector::new(self.options.blanks.clone());
        let mut combination_labels: Vec<String> = Vec::new();
        for combination in rulebook.combinations() {
            let groups = detector.group_rows(dataset, &combination.columns)?;
            let flags = DuplicateDetector::flag_rows(&groups, dataset.num_rows());
            let label = unique_label(
                &mut combination_labels,
                format!("{} | duplicate", combination.key()),
            );
            outcomes.push(RuleOutcome {
                label,
                target: RuleTarget::Combination(combination.columns.clone()),
                kind: "duplicate".into(),
                dimension: combination.dimension.clone(),
                message: combination.message.clone(),
                passed: BooleanArray::from(flags.into_iter().map(|dup| !dup).collect::<Vec<_>>()),
            });
        }

        let table = OutcomeTable::assemble(dataset.row_index().clone(), outcomes);
        info!(
            rule_columns = table.rules().len(),
            clean_rows = table.clean_rows(),
            "Rules executed"
        );
        Ok(table)
    }
}

/// Executes every rule with the default options.
pub fn execute_all_rules(
    dataset: &Dataset,
    rulebook: &Rulebook,
) -> Result<OutcomeTable, DomainError> {
    RuleExecutor::default().execute_all_rules(dataset, rulebook)
}

fn unique_label(taken: &mut Vec<String>, base: String) -> String {
    let mut label = base.clone();
    let mut n = 2;
    while taken.contains(&label) {
        label = format!("{} #{}", base, n);
        n += 1;
    }
    taken.push(label.clone());
    label
}

fn evaluate(
    rule: &Rule,
    view: &mut ColumnView<'_>,
    matchers: &FormatMatchers,
) -> Result<Vec<bool>, DomainError> {
    if let RuleKind::Range { min, max } = &rule.kind {
        let (min, max) = (*min, *max);
        let numbers = view.numbers(rule.kind.name())?;
        return Ok(numbers
            .iter()
            .map(|n| n.is_some_and(|n| min.is_none_or(|m| n >= m) && max.is_none_or(|m| n <= m)))
            .collect());
    }

    let text = &view.text;
    let passed = match &rule.kind {
        RuleKind::NotNull => (0..text.len()).map(|row| !text.is_missing(row)).collect(),
        RuleKind::Unique => {
            let mut seen: HashSet<&str> = HashSet::new();
            text.iter()
                .map(|value| match value {
                    None => true,
                    Some(v) => seen.insert(v),
                })
                .collect()
        }
        RuleKind::Pattern(pattern) => text
            .iter()
            .map(|value| value.is_some_and(|v| pattern.is_match(v)))
            .collect(),
        RuleKind::Format(format) => text
            .iter()
            .map(|value| value.is_some_and(|v| matches_format(format, v, matchers)))
            .collect(),
        RuleKind::AllowedValues(set) => text
            .iter()
            .map(|value| value.is_some_and(|v| set.contains(v)))
            .collect(),
        RuleKind::Length { min, max } => text
            .iter()
            .map(|value| {
                value.is_some_and(|v| {
                    let len = v.chars().count();
                    min.is_none_or(|m| len >= m) && max.is_none_or(|m| len <= m)
                })
            })
            .collect(),
        RuleKind::Standard(standard) => text
            .iter()
            .map(|value| value.is_some_and(|v| matches_standard(standard, v)))
            .collect(),
        RuleKind::Range { .. } => Vec::new(),
    };
    Ok(passed)
}

fn matches_format(format: &FormatKind, value: &str, matchers: &FormatMatchers) -> bool {
    match format {
        FormatKind::Email => matchers.email.is_match(value),
        FormatKind::Phone => {
            let digits = value.chars().filter(char::is_ascii_digit).count();
            matchers.phone.is_match(value) && (7..=15).contains(&digits)
        }
        FormatKind::Url => matchers.url.is_match(value),
        FormatKind::Numeric => parse_number(value).is_some(),
        FormatKind::Alphabetic => {
            value.chars().any(char::is_alphabetic)
                && value.chars().all(|c| c.is_alphabetic() || c == ' ')
        }
        FormatKind::Alphanumeric => {
            value.chars().any(char::is_alphanumeric)
                && value.chars().all(|c| c.is_alphanumeric() || c == ' ')
        }
        FormatKind::Date { date_format } => to_date(value, date_format).is_some(),
    }
}

fn matches_standard(standard: &StandardKind, value: &str) -> bool {
    let has_cased = value.chars().any(|c| c.is_uppercase() || c.is_lowercase());
    match standard {
        StandardKind::Uppercase => has_cased && !value.chars().any(char::is_lowercase),
        StandardKind::Lowercase => has_cased && !value.chars().any(char::is_uppercase),
        StandardKind::TitleCase => is_title_case(value),
        StandardKind::Trimmed => value == value.trim(),
        StandardKind::Integer => value.trim().parse::<i64>().is_ok(),
        StandardKind::Decimal => parse_number(value).is_some(),
        StandardKind::Boolean => matches!(
            value.trim().to_lowercase().as_str(),
            "true" | "false" | "yes" | "no" | "y" | "n" | "t" | "f" | "1" | "0"
        ),
        // Shape consistency: the value must be exactly what the declared
        // pattern would print for it.
        StandardKind::Date { date_format } => to_date(value, date_format).is_some_and(|parsed| {
            parsed
                .format_with_items(StrftimeItems::new(date_format))
                .to_string()
                == value.trim()
        }),
    }
}

/// Every word starts with an uppercase letter followed by lowercase letters.
fn is_title_case(value: &str) -> bool {
    let mut cased = false;
    let mut previous_cased = false;
    for c in value.chars() {
        if c.is_uppercase() {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else {
            previous_cased = false;
        }
    }
    cased
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::rules::{CombinationRule, Dimension, RuleParameters, TextPattern, ValueSet};
    use datafusion::arrow::array::{Array, Int64Array, StringArray};
    use datafusion::arrow::datatypes::{DataType, Field, Schema};
    use datafusion::arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    fn text_dataset(name: &str, values: &[Option<&str>]) -> Dataset {
        Dataset::from_text_columns(vec![(
            name.to_string(),
            values.iter().map(|v| v.map(str::to_string)).collect(),
        )])
        .unwrap()
    }

    fn single(column: &str, kind: RuleKind) -> Rulebook {
        let mut book = Rulebook::new();
        book.add_rule(Rule::new(column, kind, None, None));
        book
    }

    fn passes(dataset: &Dataset, kind: RuleKind) -> Vec<bool> {
        let column = dataset.column_names()[0].clone();
        let table = execute_all_rules(dataset, &single(&column, kind)).unwrap();
        let passed = &table.rules()[0].passed;
        (0..passed.len()).map(|i| passed.value(i)).collect()
    }

    #[test]
    fn test_email_scenario() {
        let ds = text_dataset("email", &[Some("a@x.com"), Some(""), Some("bad")]);
        let mut book = Rulebook::new();
        book.add_rule(Rule::new("email", RuleKind::NotNull, Some(Dimension::Completeness), None));
        book.add_rule(Rule::new(
            "email",
            RuleKind::Format(FormatKind::Email),
            Some(Dimension::Validation),
            None,
        ));

        let table = execute_all_rules(&ds, &book).unwrap();
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.rules()[0].label, "email | not_null");
        assert_eq!(table.rules()[1].label, "email | format:email");
        assert_eq!(table.rules()[0].passed_count(), 2);
        assert_eq!(table.rules()[1].passed_count(), 1);
        assert_eq!(table.issue_counts(), &[0, 2, 1]);
    }

    #[test]
    fn test_unique_ignores_missing_and_keeps_first_occurrence() {
        let ds = text_dataset("id", &[Some("1"), Some("2"), Some("1"), None, None, Some("1")]);
        assert_eq!(
            passes(&ds, RuleKind::Unique),
            vec![true, true, false, true, true, false]
        );
    }

    #[test]
    fn test_missing_values_fail_format_rules() {
        let ds = text_dataset("code", &[None, Some("N/A"), Some("AB1")]);
        let pattern = RuleKind::Pattern(TextPattern::full_match(r"[A-Z]{2}\d").unwrap());
        assert_eq!(passes(&ds, pattern), vec![false, false, true]);
        assert_eq!(
            passes(&ds, RuleKind::Standard(StandardKind::Uppercase)),
            vec![false, false, true]
        );
    }

    #[test]
    fn test_range_coerces_or_fails() {
        let ds = text_dataset("age", &[Some("18"), Some(" 65.5 "), Some("old"), None, Some("-1")]);
        let kind = RuleKind::Range {
            min: Some(0.0),
            max: Some(100.0),
        };
        assert_eq!(passes(&ds, kind), vec![true, true, false, false, false]);
    }

    #[test]
    fn test_range_on_numeric_column() {
        let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::Int64, true)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(Int64Array::from(vec![Some(5), None, Some(50)])) as ArrayRef],
        )
        .unwrap();
        let ds = Dataset::new(batch);
        let kind = RuleKind::Range {
            min: None,
            max: Some(10.0),
        };
        assert_eq!(passes(&ds, kind), vec![true, false, false]);
    }

    #[test]
    fn test_allowed_values_and_length() {
        let ds = text_dataset("status", &[Some("open"), Some("OPEN"), Some("gone"), None]);
        let strict =
            RuleKind::AllowedValues(ValueSet::new(vec!["open".into(), "closed".into()], true));
        assert_eq!(passes(&ds, strict), vec![true, false, false, false]);

        let relaxed = RuleKind::AllowedValues(ValueSet::new(vec!["open".into()], false));
        assert_eq!(passes(&ds, relaxed), vec![true, true, false, false]);

        let length = RuleKind::Length {
            min: Some(4),
            max: Some(4),
        };
        assert_eq!(passes(&ds, length), vec![true, true, true, false]);
    }

    #[test]
    fn test_formats() {
        let ds = text_dataset(
            "v",
            &[
                Some("+33 6 12 34 56 78"),
                Some("12"),
                Some("https://example.org/a?b=c"),
                Some("Jean Luc"),
                Some("R2D2"),
                Some("3.14"),
            ],
        );
        let m = FormatMatchers::new().unwrap();
        let column =
            TextColumn::from_array(ds.column("v").unwrap(), &BlankPolicy::default()).unwrap();
        let check = |f: FormatKind| -> Vec<bool> {
            column
                .iter()
                .map(|v| v.is_some_and(|v| matches_format(&f, v, &m)))
                .collect()
        };
        assert_eq!(check(FormatKind::Phone), vec![true, false, false, false, false, false]);
        assert_eq!(check(FormatKind::Url), vec![false, false, true, false, false, false]);
        assert_eq!(check(FormatKind::Alphabetic), vec![false, false, false, true, false, false]);
        assert_eq!(check(FormatKind::Alphanumeric), vec![false, true, false, true, true, false]);
        assert_eq!(check(FormatKind::Numeric), vec![false, true, false, false, false, true]);
    }

    #[test]
    fn test_standards() {
        assert!(matches_standard(&StandardKind::Uppercase, "ABC-1"));
        assert!(!matches_standard(&StandardKind::Uppercase, "123"));
        assert!(matches_standard(&StandardKind::Lowercase, "abc"));
        assert!(matches_standard(&StandardKind::TitleCase, "Jean-Luc O'Neil"));
        assert!(!matches_standard(&StandardKind::TitleCase, "Jean luc"));
        assert!(!matches_standard(&StandardKind::TitleCase, "JEAN"));
        assert!(!matches_standard(&StandardKind::Trimmed, " padded"));
        assert!(matches_standard(&StandardKind::Integer, "42"));
        assert!(!matches_standard(&StandardKind::Integer, "4.2"));
        assert!(matches_standard(&StandardKind::Boolean, "Yes"));

        let iso = StandardKind::Date {
            date_format: "%Y-%m-%d".into(),
        };
        assert!(matches_standard(&iso, "2024-01-05"));
        assert!(!matches_standard(&iso, "2024-1-5"));
        assert!(!matches_standard(&iso, "05/01/2024"));
    }

    #[test]
    fn test_combination_rule_column() {
        let ds = Dataset::from_text_columns(vec![
            (
                "a".into(),
                vec![Some("x".into()), Some("x".into()), None, Some("x".into())],
            ),
            (
                "b".into(),
                vec![Some("1".into()), Some("1".into()), Some("1".into()), Some("2".into())],
            ),
        ])
        .unwrap();
        let mut book = Rulebook::new();
        book.add_rule(Rule::new("a", RuleKind::NotNull, None, None));
        book.add_combination(CombinationRule::new(vec!["a".into(), "b".into()], None, None));

        let table = execute_all_rules(&ds, &book).unwrap();
        let dup = &table.rules()[1];
        assert_eq!(dup.label, "a + b | duplicate");
        assert_eq!(dup.dimension, Dimension::Uniqueness);
        assert_eq!(dup.target, RuleTarget::Combination(vec!["a".into(), "b".into()]));
        assert_eq!(table.issue_counts(), &[1, 1, 1, 0]);
    }

    #[test]
    fn test_missing_column_fails_the_run() {
        let ds = text_dataset("email", &[Some("a@x.com")]);
        let err = execute_all_rules(&ds, &single("phone", RuleKind::NotNull)).unwrap_err();
        assert!(matches!(err, DomainError::MissingColumn { column, .. } if column == "phone"));
    }

    #[test]
    fn test_repeated_rules_get_distinct_labels() {
        let ds = text_dataset("c", &[Some("a")]);
        let mut book = Rulebook::new();
        for pattern in ["a", "b"] {
            book.add_rule(Rule::new(
                "c",
                RuleKind::resolve("pattern", &RuleParameters::new().with("pattern", pattern))
                    .unwrap()
                    .unwrap(),
                None,
                None,
            ));
        }
        let table = execute_all_rules(&ds, &book).unwrap();
        let labels: Vec<&str> = table.rules().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["c | pattern", "c | pattern #2"]);
    }

    #[test]
    fn test_execution_is_deterministic_and_leaves_dataset_untouched() {
        let ds = text_dataset("id", &[Some("1"), Some("1"), Some("")]);
        let before = ds.batch().clone();
        let book = single("id", RuleKind::Unique);
        let first = execute_all_rules(&ds, &book).unwrap();
        let second = execute_all_rules(&ds, &book).unwrap();
        assert_eq!(first, second);
        assert_eq!(ds.batch(), &before);
        let original = ds.column("id").unwrap().as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(original.value(2), "");
    }
}
