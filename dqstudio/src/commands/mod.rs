// dqstudio/src/commands/mod.rs

pub mod assess;
pub mod rulebook;
pub mod summary;
