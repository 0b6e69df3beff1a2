// dqstudio/src/commands/rulebook.rs
//
// USE CASE: Normalize a rule source into a structured rulebook file.

use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use dqstudio_core::application::load_inputs;
use dqstudio_core::domain::rules::RulebookDocument;
use dqstudio_core::infrastructure::adapters::DataFusionSource;
use dqstudio_core::infrastructure::rulebook_store::{
    RulebookFormat, timestamped_rulebook_name, write_rulebook_document,
};

pub async fn execute(data: PathBuf, rules: PathBuf, out: Option<PathBuf>) -> anyhow::Result<()> {
    println!("📘 Building rulebook from {}...", rules.display());

    let source = DataFusionSource::new();
    let (_, build) = load_inputs(&source, &data, &rules)
        .await
        .with_context(|| format!("Failed to build a rulebook from {:?}", rules))?;

    for warning in &build.warnings {
        println!("   ⚠️  {}", warning);
    }

    let out = out.unwrap_or_else(|| {
        PathBuf::from(timestamped_rulebook_name(
            Local::now().naive_local(),
            RulebookFormat::Yaml,
        ))
    });
    write_rulebook_document(&RulebookDocument::from(&build.rulebook), &out)
        .with_context(|| format!("Failed to write rulebook to {:?}", out))?;

    println!(
        "✨ {} rule(s) over {} column(s) written to {}",
        build.rulebook.rule_count(),
        build.rulebook.columns().len(),
        out.display()
    );
    Ok(())
}
