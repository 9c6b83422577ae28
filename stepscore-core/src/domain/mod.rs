// stepscore-core/src/domain/mod.rs

pub mod error;
pub mod scale;
pub mod scoring;
pub mod table;

// Re-exports
pub use error::DomainError;
pub use scale::{ScaleDefinition, ScaleRegistry};
pub use table::{NormalizedCell, OutputTable, RawCell, RawTable};
