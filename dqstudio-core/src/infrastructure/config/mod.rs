// dqstudio-core/src/infrastructure/config/mod.rs

pub mod settings;

pub use settings::{AssessmentConfig, load_assessment_config};
