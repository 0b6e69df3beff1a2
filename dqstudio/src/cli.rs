// dqstudio/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dqstudio")]
#[command(about = "Rule-based data quality assessment and scoring", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🔎 Runs every rule against a dataset and prints the scorecard
    Assess {
        /// Dataset to assess (csv, tsv, parquet, ndjson)
        #[arg(long, short)]
        data: PathBuf,

        /// Rule source: a flat table (csv, ...) or a rulebook (yaml, json)
        #[arg(long, short)]
        rules: PathBuf,

        /// Settings file (default: dqstudio.yaml or dq_config.yaml if present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the outcome table, the report and the rulebook here
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Output format: table | json
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Exit with an error when the overall score is under this value
        #[arg(long)]
        fail_under: Option<f64>,
    },

    /// 📘 Normalizes a rule source into a reusable rulebook (yaml / json)
    Rulebook {
        /// Dataset the rules refer to (used to check column names)
        #[arg(long, short)]
        data: PathBuf,

        /// Rule source to normalize
        #[arg(long, short)]
        rules: PathBuf,

        /// Target file (default: rulebook_<timestamp>.yaml)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}
