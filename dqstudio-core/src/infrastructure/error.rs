// dqstudio-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DataFusion Engine Error: {0}")]
    #[diagnostic(
        code(dqstudio::infra::database::datafusion),
        help("The dataset could not be read by the query engine.")
    )]
    DataFusion(#[from] datafusion::error::DataFusionError),

    #[error("Arrow Error: {0}")]
    #[diagnostic(code(dqstudio::infra::database::arrow))]
    Arrow(#[from] datafusion::arrow::error::ArrowError),
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- DATA ENGINE ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(dqstudio::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / SERIALIZATION ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(dqstudio::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON Error: {0}")]
    #[diagnostic(code(dqstudio::infra::json))]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(dqstudio::infra::config))]
    ConfigError(String),

    #[error("Configuration not found at '{0}'")]
    #[diagnostic(code(dqstudio::infra::config_missing))]
    ConfigNotFound(String),

    #[error("File not found: '{0}'")]
    #[diagnostic(code(dqstudio::infra::not_found))]
    FileNotFound(String),

    #[error("Unsupported file format: {0}")]
    #[diagnostic(
        code(dqstudio::infra::format),
        help("Supported extensions: csv, tsv, parquet, json, ndjson, jsonl, yaml, yml.")
    )]
    UnsupportedFormat(String),
}

// Shortcuts for `?` on engine calls
impl From<datafusion::error::DataFusionError> for InfrastructureError {
    fn from(err: datafusion::error::DataFusionError) -> Self {
        InfrastructureError::Database(DatabaseError::DataFusion(err))
    }
}

impl From<datafusion::arrow::error::ArrowError> for InfrastructureError {
    fn from(err: datafusion::arrow::error::ArrowError) -> Self {
        InfrastructureError::Database(DatabaseError::Arrow(err))
    }
}
