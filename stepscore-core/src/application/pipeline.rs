// stepscore-core/src/application/pipeline.rs

use chrono::{SecondsFormat, Utc};
use std::path::Path;
use tracing::{info, instrument};

use crate::application::orchestrator::ScoringPipeline;
use crate::application::report::RunReport;
use crate::error::ScoringError;
use crate::infrastructure::adapters::{CsvTableSink, open_source};
use crate::infrastructure::config::StepscoreConfig;
use crate::infrastructure::fs::save_json;
use crate::ports::table::{TableSink, TableSource};

/// Reads the source once, scores it, writes the table and the run report.
#[instrument(skip_all, fields(source = %source.describe(), sink = %sink.describe()))]
pub fn run_pipeline(
    source: &dyn TableSource,
    sink: &dyn TableSink,
    pipeline: &ScoringPipeline,
    report_path: &Path,
) -> Result<RunReport, ScoringError> {
    println!("📥 Reading responses from {}...", source.describe());
    let raw = source.read()?;
    println!("   {} rows, up to {} columns", raw.len(), raw.max_width());

    println!("🧮 Scoring {} scales...", pipeline.registry().all_scales().len());
    let output = pipeline.run(&raw)?;

    sink.write(&output.table)?;
    println!("💾 Scores written to {}", sink.describe());

    let mut report = output.report;
    report.generated_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
    save_json(report_path, &report)?;
    info!(path = ?report_path, "Run report saved");

    if report.invalid_scores > 0 || report.unparsable_item_cells > 0 {
        println!(
            "⚠️  {} out-of-range reverse-coded answers, {} unreadable item cells (treated as missing)",
            report.invalid_scores, report.unparsable_item_cells
        );
    }

    Ok(report)
}

/// Wires the configured adapters around [`run_pipeline`]. Every path is
/// resolved against `project_dir`.
pub fn run_project(
    project_dir: &Path,
    config: &StepscoreConfig,
) -> Result<RunReport, ScoringError> {
    let pipeline = config.build_pipeline()?;

    let source = open_source(&config.input_path(project_dir), &config.input)?;
    let sink = CsvTableSink::new(config.output_path(project_dir))
        .with_bom(config.utf8_bom)
        .with_float_precision(config.float_precision);

    run_pipeline(
        source.as_ref(),
        &sink,
        &pipeline,
        &config.report_path(project_dir),
    )
}
