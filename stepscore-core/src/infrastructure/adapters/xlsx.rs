// stepscore-core/src/infrastructure/adapters/xlsx.rs

use calamine::{Data, Range, Reader, open_workbook_auto};
use std::path::PathBuf;
use tracing::{debug, instrument};

use crate::domain::table::{RawCell, RawTable};
use crate::error::ScoringError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::table::TableSource;

/// Spreadsheet export (xlsx / xlsm / xls / ods). Numeric cells stay numeric.
#[derive(Debug, Clone)]
pub struct XlsxTableSource {
    path: PathBuf,
    sheet: Option<String>,
    has_header: bool,
}

impl XlsxTableSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheet: None,
            has_header: true,
        }
    }

    /// Reads the named worksheet instead of the first one.
    pub fn with_sheet(mut self, sheet: Option<String>) -> Self {
        self.sheet = sheet;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load_range(&self) -> Result<Range<Data>, InfrastructureError> {
        let mut workbook = open_workbook_auto(&self.path)?;
        let range = match &self.sheet {
            Some(name) => workbook.worksheet_range(name)?,
            None => workbook.worksheet_range_at(0).ok_or_else(|| {
                InfrastructureError::Spreadsheet(format!(
                    "No worksheet found in {}",
                    self.path.display()
                ))
            })??,
        };
        debug!(height = range.height(), width = range.width(), "Worksheet loaded");
        Ok(range)
    }
}

impl TableSource for XlsxTableSource {
    fn describe(&self) -> String {
        match &self.sheet {
            Some(sheet) => format!("spreadsheet:{}#{}", self.path.display(), sheet),
            None => format!("spreadsheet:{}", self.path.display()),
        }
    }

    fn read(&self) -> Result<RawTable, ScoringError> {
        let range = self.load_range()?;
        Ok(range_to_table(&range, self.has_header))
    }
}

/// Converts a worksheet range into a position-addressed table.
///
/// calamine trims leading empty columns from the used range; they are padded
/// back so that column 0 is always spreadsheet column A.
pub(crate) fn range_to_table(range: &Range<Data>, has_header: bool) -> RawTable {
    let col_offset = range.start().map_or(0, |(_, col)| col as usize);

    let mut rows = range.rows().map(|row| {
        let mut cells = vec![RawCell::Empty; col_offset];
        cells.extend(row.iter().map(to_raw_cell));
        cells
    });

    let headers = if has_header {
        rows.next().map(|cells| {
            cells
                .into_iter()
                .map(|c| match c {
                    RawCell::Empty => String::new(),
                    RawCell::Number(n) => n.to_string(),
                    RawCell::Text(t) => t,
                })
                .collect()
        })
    } else {
        None
    };

    RawTable::new(headers, rows.collect())
}

fn to_raw_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Float(f) => RawCell::Number(*f),
        Data::String(s) => RawCell::from_text(s),
        other => RawCell::from_text(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_offset_is_padded() {
        // Used range starts at B1: column A was empty in the sheet.
        let mut range: Range<Data> = Range::new((0, 1), (2, 2));
        range.set_value((0, 1), Data::String("年龄".into()));
        range.set_value((0, 2), Data::String("Q1".into()));
        range.set_value((1, 1), Data::Float(18.0));
        range.set_value((1, 2), Data::String("有时如此".into()));
        range.set_value((2, 1), Data::Int(20));

        let table = range_to_table(&range, true);
        assert_eq!(table.header(0), Some(""));
        assert_eq!(table.header(1), Some("年龄"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][0], RawCell::Empty);
        assert_eq!(table.rows()[0][1], RawCell::Number(18.0));
        assert_eq!(table.rows()[0][2], RawCell::Text("有时如此".into()));
        assert_eq!(table.rows()[1][1], RawCell::Number(20.0));
        assert_eq!(table.rows()[1][2], RawCell::Empty);
    }

    #[test]
    fn test_range_without_header() {
        let mut range: Range<Data> = Range::new((0, 0), (0, 1));
        range.set_value((0, 0), Data::Bool(true));
        range.set_value((0, 1), Data::String("  ".into()));

        let table = range_to_table(&range, false);
        assert!(table.headers().is_none());
        assert_eq!(table.rows()[0][0], RawCell::Text("true".into()));
        assert_eq!(table.rows()[0][1], RawCell::Empty);
    }
}
