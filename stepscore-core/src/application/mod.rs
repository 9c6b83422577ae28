// stepscore-core/src/application/mod.rs

pub mod orchestrator;
pub mod pipeline;
pub mod report;

// --- RE-EXPORTS (FACADE PATTERN) ---
// The runner only needs `use stepscore_core::application::{run_project, RunReport};`

pub use orchestrator::{PipelineOutput, ScoringPipeline};
pub use pipeline::{run_pipeline, run_project};
pub use report::{FieldSummary, RunReport, ScaleSummary};
