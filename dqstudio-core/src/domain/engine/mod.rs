// dqstudio-core/src/domain/engine/mod.rs

pub mod duplicates;
pub mod executor;
pub mod outcome;

pub use duplicates::{CombinationDuplicates, DuplicateDetector, get_combination_duplicates};
pub use executor::{ExecutionOptions, RuleExecutor, execute_all_rules};
pub use outcome::{ISSUE_COUNT_COLUMN, OutcomeTable, ROW_INDEX_COLUMN, RuleOutcome, RuleTarget};
