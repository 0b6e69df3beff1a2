pub mod dataset;
pub mod engine;
pub mod error;
pub mod rules;
pub mod scoring;

// Re-exports pratiques pour simplifier les imports ailleurs
pub use error::DomainError;
