// stepscore-core/src/domain/table.rs

use std::fmt;

/// One cell as it comes out of the survey export, before any interpretation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawCell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl RawCell {
    /// Builds a cell from a text field. Blank fields are `Empty`.
    pub fn from_text(value: &str) -> Self {
        if value.trim().is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(value.to_string())
        }
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        RawCell::Number(value)
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        RawCell::from_text(value)
    }
}

/// Survey export addressed purely by 0-based column position.
///
/// Headers are kept for log messages only. Rows may have different widths
/// (flexible CSV); the orchestrator checks widths against the registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Option<Vec<String>>,
    rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    pub fn new(headers: Option<Vec<String>>, rows: Vec<Vec<RawCell>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> Option<&[String]> {
        self.headers.as_deref()
    }

    /// Header text at `position`, if the source had a header row.
    pub fn header(&self, position: usize) -> Option<&str> {
        self.headers
            .as_ref()
            .and_then(|h| h.get(position))
            .map(String::as_str)
    }

    pub fn rows(&self) -> &[Vec<RawCell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Widest row in the table.
    pub fn max_width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Numeric result of normalizing one raw cell.
///
/// `Value` always holds a finite number: "missing" is never encoded as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum NormalizedCell {
    Value(f64),
    #[default]
    Missing,
}

impl NormalizedCell {
    /// Wraps a number, turning NaN and infinities into `Missing`.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            NormalizedCell::Value(value)
        } else {
            NormalizedCell::Missing
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            NormalizedCell::Value(v) => Some(v),
            NormalizedCell::Missing => None,
        }
    }

    pub fn is_missing(self) -> bool {
        matches!(self, NormalizedCell::Missing)
    }
}

impl From<Option<f64>> for NormalizedCell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(NormalizedCell::Missing, NormalizedCell::from_f64)
    }
}

impl fmt::Display for NormalizedCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedCell::Value(v) => match f.precision() {
                Some(p) => write!(f, "{:.*}", p, v),
                None => write!(f, "{}", v),
            },
            NormalizedCell::Missing => Ok(()),
        }
    }
}

/// Final scored table: demographic fields followed by composite scales.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputTable {
    columns: Vec<String>,
    rows: Vec<Vec<NormalizedCell>>,
}

impl OutputTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub(crate) fn push_row(&mut self, row: Vec<NormalizedCell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<NormalizedCell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell of respondent `row` in column `name`.
    pub fn get(&self, row: usize, name: &str) -> Option<NormalizedCell> {
        let idx = self.column_index(name)?;
        self.rows.get(row).and_then(|r| r.get(idx)).copied()
    }

    /// Every respondent's value for column `name`, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<NormalizedCell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }
}
