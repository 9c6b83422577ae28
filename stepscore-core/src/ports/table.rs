// stepscore-core/src/ports/table.rs

// What the pipeline needs from the outside world: one table in, one table out.
// CSV, spreadsheets or in-memory fixtures plug in behind these traits.

use crate::domain::table::{OutputTable, RawTable};
use crate::error::ScoringError;

pub trait TableSource {
    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;

    fn read(&self) -> Result<RawTable, ScoringError>;
}

pub trait TableSink {
    fn describe(&self) -> String;

    fn write(&self, table: &OutputTable) -> Result<(), ScoringError>;
}
