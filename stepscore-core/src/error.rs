// stepscore-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoringError {
    // --- DOMAIN ERRORS (registry drift, unknown scales, bad mappings) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (IO, parsing, config) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

impl From<std::io::Error> for ScoringError {
    fn from(err: std::io::Error) -> Self {
        ScoringError::Infrastructure(InfrastructureError::Io(err))
    }
}
