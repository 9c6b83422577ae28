// stepscore-core/src/ports/mod.rs

pub mod table;

pub use table::{TableSink, TableSource};
