// dqstudio-core/src/application/assessment.rs

use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

// Imports Hexagonaux
use crate::application::report::AssessmentReport;
use crate::domain::dataset::Dataset;
use crate::domain::engine::{DuplicateDetector, ExecutionOptions, OutcomeTable, RuleExecutor};
use crate::domain::rules::{Rulebook, RulebookBuild, RulebookBuilder, RulebookDocument};
use crate::error::DqError;
use crate::infrastructure::config::AssessmentConfig;
use crate::infrastructure::export::{OUTCOMES_FILE, REPORT_FILE, write_json, write_outcomes_csv};
use crate::infrastructure::rulebook_store::{
    RuleSource, RulebookFormat, load_rule_source, timestamped_rulebook_name,
    write_rulebook_document,
};
use crate::ports::source::DatasetSource;

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct AssessmentRun {
    pub rulebook: Rulebook,
    pub outcome: OutcomeTable,
    pub report: AssessmentReport,
    /// Files written to the output directory, if exports were enabled.
    pub exported: Vec<PathBuf>,
}

/// Builds a rulebook from whichever source form was found on disk.
pub fn build_rulebook(source: &RuleSource, dataset: &Dataset) -> Result<RulebookBuild, DqError> {
    let build = match source {
        RuleSource::Tabular(rows) => {
            RulebookBuilder::build_from_tabular(rows, &dataset.column_names())?
        }
        RuleSource::Structured(document) => RulebookBuilder::load_structured(document)?,
    };
    for warning in &build.warnings {
        warn!(%warning, "Rule skipped");
    }
    Ok(build)
}

/// Loads the dataset and the rules, then builds the rulebook.
#[instrument(skip(source))]
pub async fn load_inputs(
    source: &dyn DatasetSource,
    data_path: &Path,
    rules_path: &Path,
) -> Result<(Dataset, RulebookBuild), DqError> {
    info!(engine = source.engine_name(), "Loading inputs");
    let dataset = source.load(data_path).await?;
    let rule_source = load_rule_source(source, rules_path).await?;
    let build = build_rulebook(&rule_source, &dataset)?;
    Ok((dataset, build))
}

/// Executes and scores an already built rulebook. No I/O.
#[instrument(skip_all, fields(name = %config.name, rows = dataset.num_rows()))]
pub fn evaluate(
    dataset: &Dataset,
    build: RulebookBuild,
    config: &AssessmentConfig,
) -> Result<AssessmentRun, DqError> {
    let blanks = config.blank_policy();
    let executor = RuleExecutor::new(ExecutionOptions {
        blanks: blanks.clone(),
    });
    let outcome = executor.execute_all_rules(dataset, &build.rulebook)?;
    let duplicates =
        DuplicateDetector::new(blanks).get_combination_duplicates(dataset, &build.rulebook)?;

    let report = AssessmentReport::build(
        &config.name,
        &build.rulebook,
        &outcome,
        duplicates,
        build.warnings,
    )
    .with_threshold(config.fail_under);
    info!(score = report.overall_score, band = %report.band, "Assessment scored");

    Ok(AssessmentRun {
        rulebook: build.rulebook,
        outcome,
        report,
        exported: Vec::new(),
    })
}

/// Full use case: load, build, execute, score, then export what the
/// configuration asks for.
#[instrument(skip(source, config))]
pub async fn run_assessment(
    source: &dyn DatasetSource,
    data_path: &Path,
    rules_path: &Path,
    config: &AssessmentConfig,
) -> Result<AssessmentRun, DqError> {
    // 1. Chargement
    let (dataset, build) = load_inputs(source, data_path, rules_path).await?;

    // 2. Exécution + scoring
    let mut run = evaluate(&dataset, build, config)?;

    // 3. Exports
    let output_dir = config.output_path();
    if config.export_rulebook {
        let name = timestamped_rulebook_name(Local::now().naive_local(), RulebookFormat::Yaml);
        let path = output_dir.join(name);
        write_rulebook_document(&RulebookDocument::from(&run.rulebook), &path)?;
        run.exported.push(path);
    }
    if config.export_outcomes {
        let outcomes = output_dir.join(OUTCOMES_FILE);
        write_outcomes_csv(&run.outcome, &outcomes)?;
        run.exported.push(outcomes);

        let report = output_dir.join(REPORT_FILE);
        write_json(&run.report, &report)?;
        run.exported.push(report);
    }

    Ok(run)
}
