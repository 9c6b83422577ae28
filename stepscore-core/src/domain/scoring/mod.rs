// stepscore-core/src/domain/scoring/mod.rs

pub mod aggregate;
pub mod demographic;
pub(crate) mod digits;
pub mod likert;
pub mod reverse;

pub use aggregate::aggregate;
pub use demographic::{DemographicFieldSpec, DemographicParser};
pub use likert::{LikertLevel, LikertMapping};
pub use reverse::{correct, correct_cell};
