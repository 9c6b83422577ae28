// stepscore-core/src/infrastructure/adapters/csv.rs

use csv::{ByteRecord, ReaderBuilder, Trim, WriterBuilder};
use std::path::PathBuf;
use tracing::{debug, instrument};

use crate::domain::table::{OutputTable, RawCell, RawTable};
use crate::error::ScoringError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;
use crate::ports::table::{TableSink, TableSource};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Delimited text export. Every non-blank field is kept as text; numeric
/// interpretation is the normalizer's job.
#[derive(Debug, Clone)]
pub struct CsvTableSource {
    path: PathBuf,
    delimiter: u8,
    has_header: bool,
    trim: bool,
}

impl CsvTableSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
            has_header: true,
            trim: true,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Whether to strip surrounding whitespace from every field (default: yes).
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<RawTable, InfrastructureError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .from_reader(bytes);

        let mut headers = None;
        let mut rows = Vec::new();
        let mut record = ByteRecord::new();

        while reader.read_byte_record(&mut record)? {
            if self.has_header && headers.is_none() {
                headers = Some(record.iter().map(lossy).collect());
                continue;
            }
            rows.push(
                record
                    .iter()
                    .map(|field| RawCell::from_text(&lossy(field)))
                    .collect(),
            );
        }

        debug!(rows = rows.len(), "CSV parsed");
        Ok(RawTable::new(headers, rows))
    }
}

// Survey exports are not always clean UTF-8; keep what can be read.
fn lossy(field: &[u8]) -> String {
    String::from_utf8_lossy(field).into_owned()
}

impl TableSource for CsvTableSource {
    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn read(&self) -> Result<RawTable, ScoringError> {
        let bytes = std::fs::read(&self.path)?;
        Ok(self.parse_bytes(&bytes)?)
    }
}

/// Writes the scored table as delimited text, atomically.
#[derive(Debug, Clone)]
pub struct CsvTableSink {
    path: PathBuf,
    utf8_bom: bool,
    float_precision: Option<usize>,
}

impl CsvTableSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            utf8_bom: true,
            float_precision: None,
        }
    }

    /// Prefix the file with a UTF-8 BOM so spreadsheet tools detect the encoding.
    pub fn with_bom(mut self, utf8_bom: bool) -> Self {
        self.utf8_bom = utf8_bom;
        self
    }

    pub fn with_float_precision(mut self, precision: Option<usize>) -> Self {
        self.float_precision = precision;
        self
    }

    pub fn render(&self, table: &OutputTable) -> Result<Vec<u8>, InfrastructureError> {
        let mut buffer = Vec::new();
        if self.utf8_bom {
            buffer.extend_from_slice(UTF8_BOM);
        }

        let mut writer = WriterBuilder::new().from_writer(buffer);

        writer.write_record(table.columns())?;
        for row in table.rows() {
            let fields = row.iter().map(|cell| match self.float_precision {
                Some(p) => format!("{:.*}", p, cell),
                None => cell.to_string(),
            });
            writer.write_record(fields)?;
        }

        writer
            .into_inner()
            .map_err(|e| InfrastructureError::Io(e.into_error()))
    }
}

impl TableSink for CsvTableSink {
    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn write(&self, table: &OutputTable) -> Result<(), ScoringError> {
        let content = self.render(table)?;
        atomic_write(&self.path, content)?;
        Ok(())
    }
}
