// dqstudio/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use dqstudio_core::DqError;
use miette::GraphicalReportHandler;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // 1. Setup Logging (Tracing)
    // RUST_LOG=debug dqstudio assess ... pour voir les détails
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = dispatch(cli).await {
        eprintln!("\n💥 {:#}", err);
        // Domain and infrastructure errors carry a code and a hint.
        if let Some(diagnostic) = err.downcast_ref::<DqError>() {
            let mut rendered = String::new();
            if GraphicalReportHandler::new()
                .render_report(&mut rendered, diagnostic)
                .is_ok()
            {
                eprintln!("{}", rendered);
            }
        }
        std::process::exit(1);
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        // --- USE CASE: ASSESS ---
        Commands::Assess {
            data,
            rules,
            config,
            output_dir,
            format,
            fail_under,
        } => {
            commands::assess::execute(commands::assess::AssessArgs {
                data,
                rules,
                config,
                output_dir,
                format,
                fail_under,
            })
            .await
        }

        // --- USE CASE: RULEBOOK EXPORT ---
        Commands::Rulebook { data, rules, out } => {
            commands::rulebook::execute(data, rules, out).await
        }
    }
}
