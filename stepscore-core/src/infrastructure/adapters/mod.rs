// stepscore-core/src/infrastructure/adapters/mod.rs

pub mod csv;
pub mod xlsx;

use std::path::Path;
use tracing::debug;

use crate::infrastructure::config::InputConfig;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::table::TableSource;

pub use self::csv::{CsvTableSink, CsvTableSource};
pub use self::xlsx::XlsxTableSource;

/// Picks the table reader from the file extension.
pub fn open_source(
    path: &Path,
    input: &InputConfig,
) -> Result<Box<dyn TableSource>, InfrastructureError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    debug!(path = ?path, extension = %extension, "Selecting table adapter");

    match extension.as_str() {
        "csv" | "tsv" | "txt" => Ok(Box::new(
            CsvTableSource::new(path)
                .with_delimiter(input.delimiter_for(&extension)?)
                .with_header(input.has_header)
                .with_trim(input.trim),
        )),
        "xlsx" | "xlsm" | "xls" | "ods" => Ok(Box::new(
            XlsxTableSource::new(path)
                .with_sheet(input.sheet.clone())
                .with_header(input.has_header),
        )),
        _ => Err(InfrastructureError::UnsupportedFormat(
            path.display().to_string(),
        )),
    }
}
