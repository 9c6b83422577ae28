// stepscore/src/main.rs

use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use stepscore_core::ScoringError;
use stepscore_core::application::run_project;
use stepscore_core::infrastructure::config::load_project_config;

const PROJECT_DIR_ENV: &str = "STEPSCORE_PROJECT_DIR";

fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug stepscore for per-column details; registry warnings by default.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let project_dir = std::env::var_os(PROJECT_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let start = std::time::Instant::now();
    info!(project_dir = ?project_dir, "Starting scoring run");

    println!("⚙️  Loading configuration...");
    let config = match load_project_config(&project_dir) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration could not be loaded");
            eprintln!("\n💥 CONFIGURATION ERROR:\n{:?}", miette::Report::new(e));
            std::process::exit(1);
        }
    };
    println!("   Project: {} (v{})", config.name, config.version);

    match run_project(&project_dir, &config) {
        Ok(report) => {
            info!(
                rows = report.rows_processed,
                invalid_scores = report.invalid_scores,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Scoring run finished"
            );
            println!(
                "\n✨ SUCCESS! {} respondents scored in {:.2?}",
                report.rows_processed,
                start.elapsed()
            );
        }
        Err(e) => {
            error!("Scoring run aborted");
            eprintln!("\n💥 CRITICAL PIPELINE ERROR:\n{}", render(e));
            std::process::exit(1);
        }
    }

    Ok(())
}

fn render(err: ScoringError) -> String {
    match err {
        ScoringError::Domain(e) => format!("{:?}", miette::Report::new(e)),
        ScoringError::Infrastructure(e) => format!("{:?}", miette::Report::new(e)),
    }
}
