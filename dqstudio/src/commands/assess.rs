// dqstudio/src/commands/assess.rs
//
// USE CASE: Assess a dataset against a rule source.

use std::path::PathBuf;

use anyhow::Context;
use dqstudio_core::application::run_assessment;
use dqstudio_core::infrastructure::adapters::DataFusionSource;
use dqstudio_core::infrastructure::config::load_assessment_config;
use tracing::info;

use crate::cli::OutputFormat;
use crate::commands::summary;

pub struct AssessArgs {
    pub data: PathBuf,
    pub rules: PathBuf,
    pub config: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub format: OutputFormat,
    pub fail_under: Option<f64>,
}

pub async fn execute(args: AssessArgs) -> anyhow::Result<()> {
    let start = std::time::Instant::now();
    let verbose = args.format == OutputFormat::Table;

    // A. Load the Config (Infra)
    let cwd = std::env::current_dir().context("Cannot resolve the working directory")?;
    let mut config = load_assessment_config(args.config.as_deref(), &cwd)
        .with_context(|| format!("Failed to load assessment configuration from {:?}", cwd))?;

    // CLI flags win over the file and the environment.
    if let Some(dir) = args.output_dir {
        config.output_dir = dir.display().to_string();
        config.export_outcomes = true;
        config.export_rulebook = true;
    }
    if let Some(threshold) = args.fail_under {
        anyhow::ensure!(
            (0.0..=100.0).contains(&threshold),
            "--fail-under must be within 0..=100 (got {})",
            threshold
        );
        config.fail_under = Some(threshold);
    }

    if verbose {
        println!("⚙️  Assessing {} with {}", args.data.display(), args.rules.display());
    }

    // B. Run the Assessment (Application Layer)
    let source = DataFusionSource::new();
    let run = run_assessment(&source, &args.data, &args.rules, &config)
        .await
        .with_context(|| format!("Assessment of {:?} failed", args.data))?;

    info!(
        score = run.report.overall_score,
        exported = run.exported.len(),
        "Assessment complete"
    );

    // C. Report
    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&run.report)?);
        }
        OutputFormat::Table => {
            summary::print_report(&run.report);
            for path in &run.exported {
                println!("📝 Written {}", path.display());
            }
        }
    }

    if !run.report.meets_threshold() {
        eprintln!(
            "\n❌ FAILURE. Overall score {:.1}% is under the {:.1}% threshold.",
            run.report.overall_score,
            config.fail_under.unwrap_or_default()
        );
        // Exit with error code for CI/CD
        std::process::exit(1);
    }

    if verbose {
        println!("\n✨ Assessment finished in {:.2?}", start.elapsed());
    }
    Ok(())
}
