// stepscore-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(stepscore::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(stepscore::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(stepscore::infra::config))]
    ConfigError(String),

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(code(stepscore::infra::config_missing))]
    ConfigNotFound(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(stepscore::infra::validation),
        help("Fix the fields listed above in stepscore.yaml.")
    )]
    Validation(#[from] validator::ValidationErrors),

    // --- TABULAR I/O ---
    #[error("CSV Error: {0}")]
    #[diagnostic(
        code(stepscore::infra::csv),
        help("Check the delimiter and quoting of the input file.")
    )]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet Error: {0}")]
    #[diagnostic(code(stepscore::infra::spreadsheet))]
    Spreadsheet(String),

    #[error("Unsupported table format: '{0}'")]
    #[diagnostic(
        code(stepscore::infra::format),
        help("Supported inputs: csv, tsv, txt, xlsx, xlsm, xls, ods.")
    )]
    UnsupportedFormat(String),
}

impl From<calamine::Error> for InfrastructureError {
    fn from(err: calamine::Error) -> Self {
        InfrastructureError::Spreadsheet(err.to_string())
    }
}

impl From<anyhow::Error> for InfrastructureError {
    fn from(err: anyhow::Error) -> Self {
        InfrastructureError::ConfigError(format!("{:#}", err))
    }
}
