// stepscore-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, PartialEq)]
pub enum DomainError {
    #[error("Scale '{0}' is not registered")]
    #[diagnostic(
        code(stepscore::domain::unknown_scale),
        help("Check the scale name against the registry (scales.yml or the built-in registry).")
    )]
    UnknownScale(String),

    #[error(
        "Column {position} required by '{owner}' is missing on row {row} (row has {width} columns)"
    )]
    #[diagnostic(
        code(stepscore::domain::missing_column),
        help(
            "The scale registry and the data source have drifted apart. Fix the registry positions or the export before re-running."
        )
    )]
    MissingColumn {
        row: usize,
        position: usize,
        width: usize,
        owner: String,
    },

    #[error("Score {value} is outside the response range [1, {scale_max}]")]
    #[diagnostic(code(stepscore::domain::invalid_score))]
    InvalidScore { value: f64, scale_max: u32 },

    #[error("Invalid scale registry: {0}")]
    #[diagnostic(code(stepscore::domain::registry))]
    InvalidRegistry(String),

    #[error("Invalid demographic pattern: {0}")]
    #[diagnostic(code(stepscore::domain::pattern))]
    InvalidPattern(String),

    #[error("Invalid Likert mapping: {0}")]
    #[diagnostic(
        code(stepscore::domain::likert),
        help("Codes must be the contiguous integers 1..n, one per distinct label.")
    )]
    InvalidMapping(String),
}
