// dqstudio-core/src/domain/rules/kind.rs

use chrono::format::{Item, StrftimeItems};
use regex::Regex;
use std::collections::HashSet;
use std::fmt;

use super::dimension::Dimension;
use super::parameters::{RuleParameters, split_list};

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

// Parameter aliases accepted from rule sources (first entry is canonical).
const PATTERN_KEYS: &[&str] = &["pattern", "regex"];
const FORMAT_KEYS: &[&str] = &["format"];
const STANDARD_KEYS: &[&str] = &["standard"];
const DATE_FORMAT_KEYS: &[&str] = &["date_format", "datetime_format"];
const MIN_KEYS: &[&str] = &["min", "min_value", "minimum"];
const MAX_KEYS: &[&str] = &["max", "max_value", "maximum"];
const VALUES_KEYS: &[&str] = &["values", "allowed_values", "allowed"];
const CASE_KEYS: &[&str] = &["case_sensitive"];
const MIN_LENGTH_KEYS: &[&str] = &["min_length"];
const MAX_LENGTH_KEYS: &[&str] = &["max_length"];

/// A regular expression that must match the whole value.
#[derive(Debug, Clone)]
pub struct TextPattern {
    source: String,
    regex: Regex,
}

impl TextPattern {
    pub fn full_match(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for TextPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Membership set for `allowed_values`, with the lookup key precomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSet {
    values: Vec<String>,
    case_sensitive: bool,
    lookup: HashSet<String>,
}

impl ValueSet {
    pub fn new(values: Vec<String>, case_sensitive: bool) -> Self {
        let lookup = values
            .iter()
            .map(|v| Self::key(v, case_sensitive))
            .collect();
        Self {
            values,
            case_sensitive,
            lookup,
        }
    }

    fn key(value: &str, case_sensitive: bool) -> String {
        if case_sensitive {
            value.to_string()
        } else {
            value.to_lowercase()
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn contains(&self, value: &str) -> bool {
        if self.case_sensitive {
            self.lookup.contains(value)
        } else {
            self.lookup.contains(&value.to_lowercase())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormatKind {
    Email,
    Phone,
    Url,
    Numeric,
    Alphabetic,
    Alphanumeric,
    Date { date_format: String },
}

impl FormatKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Url => "url",
            Self::Numeric => "numeric",
            Self::Alphabetic => "alphabetic",
            Self::Alphanumeric => "alphanumeric",
            Self::Date { .. } => "date",
        }
    }

    fn parse(name: &str, params: &RuleParameters) -> Result<Option<Self>, String> {
        let format = match normalize(name).as_str() {
            "email" | "e_mail" => Self::Email,
            "phone" | "telephone" | "phone_number" => Self::Phone,
            "url" | "uri" | "website" => Self::Url,
            "numeric" | "number" => Self::Numeric,
            "alphabetic" | "alpha" | "letters" => Self::Alphabetic,
            "alphanumeric" | "alnum" => Self::Alphanumeric,
            "date" | "datetime" => Self::Date {
                date_format: date_format(params)?,
            },
            _ => return Ok(None),
        };
        Ok(Some(format))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StandardKind {
    Uppercase,
    Lowercase,
    TitleCase,
    Trimmed,
    Integer,
    Decimal,
    Boolean,
    Date { date_format: String },
}

impl StandardKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uppercase => "uppercase",
            Self::Lowercase => "lowercase",
            Self::TitleCase => "title_case",
            Self::Trimmed => "trimmed",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Date { .. } => "date",
        }
    }

    fn parse(name: &str, params: &RuleParameters) -> Result<Option<Self>, String> {
        let standard = match normalize(name).as_str() {
            "uppercase" | "upper" | "upper_case" => Self::Uppercase,
            "lowercase" | "lower" | "lower_case" => Self::Lowercase,
            "title_case" | "titlecase" | "title" | "proper_case" => Self::TitleCase,
            "trimmed" | "trim" | "no_padding" => Self::Trimmed,
            "integer" | "int" => Self::Integer,
            "decimal" | "float" => Self::Decimal,
            "boolean" | "bool" => Self::Boolean,
            "date" | "date_format" => Self::Date {
                date_format: date_format(params)?,
            },
            _ => return Ok(None),
        };
        Ok(Some(standard))
    }
}

/// The closed set of single-column rule kinds.
///
/// Every variant carries only the parameters its evaluation needs, already
/// validated. A `RuleKind` value can always be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    NotNull,
    Unique,
    Pattern(TextPattern),
    Format(FormatKind),
    Range { min: Option<f64>, max: Option<f64> },
    AllowedValues(ValueSet),
    Length { min: Option<usize>, max: Option<usize> },
    Standard(StandardKind),
}

impl RuleKind {
    /// Canonical kind name, as written in structured rulebooks.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotNull => "not_null",
            Self::Unique => "unique",
            Self::Pattern(_) => "pattern",
            Self::Format(_) => "format",
            Self::Range { .. } => "range",
            Self::AllowedValues(_) => "allowed_values",
            Self::Length { .. } => "length",
            Self::Standard(_) => "standard",
        }
    }

    /// Short label used in outcome column names (`format:email`).
    pub fn label(&self) -> String {
        match self {
            Self::Format(format) => format!("format:{}", format.name()),
            Self::Standard(standard) => format!("standard:{}", standard.name()),
            other => other.name().to_string(),
        }
    }

    pub fn default_dimension(&self) -> Dimension {
        match self {
            Self::NotNull => Dimension::Completeness,
            Self::Unique => Dimension::Uniqueness,
            Self::Standard(_) => Dimension::Standardization,
            _ => Dimension::Validation,
        }
    }

    /// Resolves free rule text plus parameters into a kind.
    ///
    /// `Ok(None)` means the text names no known kind; `Err` means the kind is
    /// known but its parameters are malformed.
    pub fn resolve(raw: &str, params: &RuleParameters) -> Result<Option<Self>, String> {
        let (head, arg) = split_kind(raw);
        let kind = match head.as_str() {
            "not_null" | "notnull" | "completeness" | "required" | "mandatory" => {
                no_argument(&head, arg.as_deref())?;
                Self::NotNull
            }
            "unique" | "uniqueness" | "no_duplicates" => {
                no_argument(&head, arg.as_deref())?;
                Self::Unique
            }
            "pattern" | "regex" | "regex_match" => {
                let source = arg
                    .or_else(|| params.text(PATTERN_KEYS))
                    .ok_or("pattern rule requires a 'pattern' parameter")?;
                let pattern = TextPattern::full_match(&source)
                    .map_err(|e| format!("invalid pattern '{}': {}", source, e))?;
                Self::Pattern(pattern)
            }
            "format" | "format_check" => {
                let name = arg
                    .or_else(|| params.text(FORMAT_KEYS))
                    .ok_or("format rule requires a 'format' parameter")?;
                let format = FormatKind::parse(&name, params)?
                    .ok_or_else(|| format!("unknown format '{}'", name))?;
                Self::Format(format)
            }
            "range" | "between" | "numeric_range" => {
                no_argument(&head, arg.as_deref())?;
                let min = params.number(MIN_KEYS)?;
                let max = params.number(MAX_KEYS)?;
                check_bounds(min, max)?;
                Self::Range { min, max }
            }
            "allowed_values" | "valid_values" | "in" | "domain" | "value_list" => {
                let values = arg
                    .map(|a| split_list(&a))
                    .or_else(|| params.list(VALUES_KEYS))
                    .unwrap_or_default();
                if values.is_empty() {
                    return Err("allowed_values rule requires a non-empty 'values' list".into());
                }
                let case_sensitive = params.flag(CASE_KEYS)?.unwrap_or(true);
                Self::AllowedValues(ValueSet::new(values, case_sensitive))
            }
            "length" | "text_length" => {
                no_argument(&head, arg.as_deref())?;
                let min = params.count(MIN_LENGTH_KEYS)?;
                let max = params.count(MAX_LENGTH_KEYS)?;
                check_bounds(min, max)?;
                Self::Length { min, max }
            }
            "standard" | "standardization" | "type" | "type_check" => {
                let name = arg
                    .or_else(|| params.text(STANDARD_KEYS))
                    .ok_or("standard rule requires a 'standard' parameter")?;
                let standard = StandardKind::parse(&name, params)?
                    .ok_or_else(|| format!("unknown standard '{}'", name))?;
                Self::Standard(standard)
            }
            other => {
                // Bare format/standard names ("email", "uppercase"). Only a
                // date takes an argument, its strftime pattern ("date:%d/%m/%Y").
                let params = match &arg {
                    Some(date_format) => params.clone().with("date_format", date_format.as_str()),
                    None => params.clone(),
                };
                let kind = if let Some(format) = FormatKind::parse(other, &params)? {
                    Self::Format(format)
                } else if let Some(standard) = StandardKind::parse(other, &params)? {
                    Self::Standard(standard)
                } else {
                    return Ok(None);
                };
                if !kind.is_dated() {
                    no_argument(other, arg.as_deref())?;
                }
                kind
            }
        };
        Ok(Some(kind))
    }

    fn is_dated(&self) -> bool {
        matches!(
            self,
            Self::Format(FormatKind::Date { .. }) | Self::Standard(StandardKind::Date { .. })
        )
    }

    /// Canonical parameters, the inverse of [`RuleKind::resolve`].
    pub fn parameters(&self) -> RuleParameters {
        let mut params = RuleParameters::new();
        match self {
            Self::NotNull | Self::Unique => {}
            Self::Pattern(pattern) => params.insert("pattern", pattern.as_str()),
            Self::Format(format) => {
                params.insert("format", format.name());
                if let FormatKind::Date { date_format } = format {
                    params.insert("date_format", date_format.as_str());
                }
            }
            Self::Range { min, max } => {
                if let Some(min) = min {
                    params.insert("min", *min);
                }
                if let Some(max) = max {
                    params.insert("max", *max);
                }
            }
            Self::AllowedValues(set) => {
                params.insert("values", set.values().to_vec());
                params.insert("case_sensitive", set.case_sensitive());
            }
            Self::Length { min, max } => {
                if let Some(min) = min {
                    params.insert("min_length", *min as u64);
                }
                if let Some(max) = max {
                    params.insert("max_length", *max as u64);
                }
            }
            Self::Standard(standard) => {
                params.insert("standard", standard.name());
                if let StandardKind::Date { date_format } = standard {
                    params.insert("date_format", date_format.as_str());
                }
            }
        }
        params
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Rule texts that declare a duplicate check over a column combination.
pub fn is_combination_kind(raw: &str) -> bool {
    let (head, _) = split_kind(raw);
    matches!(
        head.as_str(),
        "duplicate" | "duplicates" | "combination" | "unique_combination" | "composite_unique"
    )
}

/// Whether the rule text is a single-column uniqueness rule (which becomes a
/// combination rule when several columns are named).
pub fn is_unique_kind(raw: &str) -> bool {
    let (head, _) = split_kind(raw);
    matches!(head.as_str(), "unique" | "uniqueness" | "no_duplicates")
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase().replace(['-', ' '], "_")
}

/// Splits `kind:argument`. The argument keeps its case (it may be a regex).
fn split_kind(raw: &str) -> (String, Option<String>) {
    let trimmed = raw.trim();
    match trimmed.split_once(':') {
        Some((head, arg)) => {
            let arg = arg.trim();
            (normalize(head), (!arg.is_empty()).then(|| arg.to_string()))
        }
        None => (normalize(trimmed), None),
    }
}

fn no_argument(kind: &str, arg: Option<&str>) -> Result<(), String> {
    match arg {
        Some(arg) => Err(format!("rule '{}' takes no argument, got '{}'", kind, arg)),
        None => Ok(()),
    }
}

fn date_format(params: &RuleParameters) -> Result<String, String> {
    let format = params
        .text(DATE_FORMAT_KEYS)
        .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());
    if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid date format '{}'", format));
    }
    Ok(format)
}

fn check_bounds<T: PartialOrd + fmt::Display>(
    min: Option<T>,
    max: Option<T>,
) -> Result<(), String> {
    match (min, max) {
        (None, None) => Err("at least one bound (min or max) is required".into()),
        (Some(min), Some(max)) if min > max => {
            Err(format!("min ({}) is greater than max ({})", min, max))
        }
        _ => Ok(()),
    }
}
