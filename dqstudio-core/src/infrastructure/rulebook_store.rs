// dqstudio-core/src/infrastructure/rulebook_store.rs

use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

use crate::domain::dataset::{BlankPolicy, Dataset, TextColumn};
use crate::domain::rules::{RuleRow, RulebookDocument};
use crate::error::DqError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;
use crate::ports::source::DatasetSource;

const COLUMN_HEADERS: &[&str] = &["column_name", "column", "field", "field_name"];
const RULE_HEADERS: &[&str] = &["rule", "rule_type", "check"];
const DIMENSION_HEADERS: &[&str] = &["dimension"];
const MESSAGE_HEADERS: &[&str] = &["message", "description"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulebookFormat {
    Yaml,
    Json,
}

impl RulebookFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

/// A rule source as found on disk, before it is turned into a rulebook.
#[derive(Debug, Clone)]
pub enum RuleSource {
    Tabular(Vec<RuleRow>),
    Structured(RulebookDocument),
}

/// Reads rules from a structured document (YAML/JSON) or a flat table
/// (anything the dataset source can read).
#[instrument(skip(source))]
pub async fn load_rule_source(
    source: &dyn DatasetSource,
    path: &Path,
) -> Result<RuleSource, DqError> {
    if let Some(format) = RulebookFormat::from_path(path) {
        return Ok(RuleSource::Structured(read_rulebook_document(path, format)?));
    }
    let table = source.load(path).await?;
    let rows = rule_rows_from_dataset(&table)?;
    info!(rows = rows.len(), "Tabular rule source loaded");
    Ok(RuleSource::Tabular(rows))
}

pub fn read_rulebook_document(
    path: &Path,
    format: RulebookFormat,
) -> Result<RulebookDocument, InfrastructureError> {
    let content = fs::read_to_string(path)?;
    let document = match format {
        RulebookFormat::Yaml => serde_yaml::from_str(&content)?,
        RulebookFormat::Json => serde_json::from_str(&content)?,
    };
    Ok(document)
}

/// Saves the document, picking YAML or JSON from the file extension.
#[instrument(skip(document))]
pub fn write_rulebook_document(
    document: &RulebookDocument,
    path: &Path,
) -> Result<(), InfrastructureError> {
    let format = RulebookFormat::from_path(path)
        .ok_or_else(|| InfrastructureError::UnsupportedFormat(path.display().to_string()))?;
    let content = match format {
        RulebookFormat::Yaml => serde_yaml::to_string(document)?,
        RulebookFormat::Json => serde_json::to_string_pretty(document)?,
    };
    atomic_write(path, content)?;
    info!(path = ?path, "Rulebook exported");
    Ok(())
}

/// `rulebook_YYYYMMDD_HHMMSS.<ext>`
pub fn timestamped_rulebook_name(at: NaiveDateTime, format: RulebookFormat) -> String {
    format!("rulebook_{}.{}", at.format("%Y%m%d_%H%M%S"), format.extension())
}

fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Turns a flat rule table into rule records.
///
/// Headers are matched case-insensitively. `column_name` and `rule` are
/// required; every header other than the four known ones becomes a rule
/// parameter, set only where the cell is non-blank.
pub fn rule_rows_from_dataset(table: &Dataset) -> Result<Vec<RuleRow>, InfrastructureError> {
    // Only empty cells count as blank in a rule table: "NA" may be a legitimate value.
    let blanks = BlankPolicy::new(Vec::<&str>::new());
    let headers: Vec<(String, String)> = table
        .column_names()
        .into_iter()
        .map(|name| (normalize_header(&name), name))
        .collect();

    let find = |aliases: &[&str]| {
        headers
            .iter()
            .find(|(normalized, _)| aliases.contains(&normalized.as_str()))
            .map(|(_, original)| original.clone())
    };
    let column_header = find(COLUMN_HEADERS);
    let rule_header = find(RULE_HEADERS);
    let (Some(column_header), Some(rule_header)) = (column_header, rule_header) else {
        return Err(InfrastructureError::ConfigError(format!(
            "Rule table needs 'column_name' and 'rule' headers, found: {:?}",
            table.column_names()
        )));
    };
    let dimension_header = find(DIMENSION_HEADERS);
    let message_header = find(MESSAGE_HEADERS);

    let known: HashSet<&str> = [
        Some(column_header.as_str()),
        Some(rule_header.as_str()),
        dimension_header.as_deref(),
        message_header.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();

    let text = |name: &str| -> Result<TextColumn, InfrastructureError> {
        let array = table.column(name).ok_or_else(|| {
            InfrastructureError::ConfigError(format!("Rule table lost column '{}'", name))
        })?;
        Ok(TextColumn::from_array(array, &blanks)?)
    };
    let columns = text(&column_header)?;
    let rules = text(&rule_header)?;
    let dimensions = dimension_header.as_deref().map(text).transpose()?;
    let messages = message_header.as_deref().map(text).transpose()?;
    let extras = headers
        .iter()
        .filter(|(_, original)| !known.contains(original.as_str()))
        .map(|(normalized, original)| Ok((normalized.clone(), text(original)?)))
        .collect::<Result<Vec<_>, InfrastructureError>>()?;

    let cell = |column: Option<&TextColumn>, row: usize| {
        column.and_then(|c| c.value(row)).unwrap_or_default().to_string()
    };

    let mut rows = Vec::with_capacity(table.num_rows());
    for row in 0..table.num_rows() {
        // Fully blank lines are spreadsheet padding.
        if columns.is_missing(row) && rules.is_missing(row) {
            continue;
        }
        let mut record = RuleRow::new(
            row + 1,
            &cell(Some(&columns), row),
            &cell(Some(&rules), row),
            &cell(dimensions.as_ref(), row),
            &cell(messages.as_ref(), row),
        );
        for (key, values) in &extras {
            if let Some(value) = values.value(row) {
                record = record.with_param(key, value.trim());
            }
        }
        rows.push(record);
    }
    Ok(rows)
}
