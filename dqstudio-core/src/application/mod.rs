// dqstudio-core/src/application/mod.rs

pub mod assessment;
pub mod report;

// --- RE-EXPORTS (FACADE PATTERN) ---
// Le CLI peut faire `use dqstudio_core::application::{run_assessment, AssessmentReport};`
// sans connaître la structure interne des fichiers.

pub use assessment::{AssessmentRun, build_rulebook, evaluate, load_inputs, run_assessment};
pub use report::{AssessmentReport, ColumnScoreLine};
