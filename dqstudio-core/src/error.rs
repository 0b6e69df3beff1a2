// dqstudio-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DqError {
    // --- ERREURS DU DOMAINE (Rulebook, colonnes manquantes) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- ERREURS D'INFRASTRUCTURE (IO, Parsing) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- ERREURS GÉNÉRIQUES / APPLICATIVES ---
    #[error("Internal Error: {0}")]
    #[diagnostic(code(dqstudio::internal))]
    InternalError(String),
}

// Manual implementation to avoid duplicate enum variant but keep ergonomics
impl From<std::io::Error> for DqError {
    fn from(err: std::io::Error) -> Self {
        DqError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<datafusion::error::DataFusionError> for DqError {
    fn from(err: datafusion::error::DataFusionError) -> Self {
        DqError::Infrastructure(err.into())
    }
}
