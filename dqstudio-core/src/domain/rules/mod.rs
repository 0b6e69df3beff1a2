// dqstudio-core/src/domain/rules/mod.rs

pub mod builder;
pub mod dimension;
pub mod document;
pub mod kind;
pub mod parameters;
pub mod rule;
pub mod rulebook;

// Re-exports
pub use builder::{BuildWarning, RuleIssue, RuleRow, RulebookBuild, RulebookBuilder};
pub use dimension::Dimension;
pub use document::{CombinationSpec, RuleSpec, RulebookDocument};
pub use kind::{FormatKind, RuleKind, StandardKind, TextPattern, ValueSet};
pub use parameters::RuleParameters;
pub use rule::{CombinationRule, Rule};
pub use rulebook::{ColumnRules, Rulebook};
