// dqstudio-core/src/infrastructure/export.rs

use datafusion::arrow::csv::WriterBuilder;
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument};

use crate::domain::engine::OutcomeTable;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;

pub const OUTCOMES_FILE: &str = "outcomes.csv";
pub const REPORT_FILE: &str = "assessment_report.json";

/// Writes the outcome table (row index, one boolean per rule, issue count)
/// as CSV with a header line.
#[instrument(skip(outcome), fields(rows = outcome.num_rows()))]
pub fn write_outcomes_csv(outcome: &OutcomeTable, path: &Path) -> Result<(), InfrastructureError> {
    let batch = outcome.to_record_batch()?;
    let mut writer = WriterBuilder::new().with_header(true).build(Vec::new());
    writer.write(&batch)?;
    atomic_write(path, writer.into_inner())?;
    info!(path = ?path, "Outcome table exported");
    Ok(())
}

#[instrument(skip(value))]
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), InfrastructureError> {
    let content = serde_json::to_string_pretty(value)?;
    atomic_write(path, content)?;
    Ok(())
}
