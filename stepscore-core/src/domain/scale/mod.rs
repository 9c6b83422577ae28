// stepscore-core/src/domain/scale/mod.rs

pub mod definition;
pub mod registry;

pub use definition::{DEFAULT_SCALE_MAX, ScaleDefinition};
pub use registry::{MIRRORED_OFFSETS_NOTE, ScaleRegistry};
