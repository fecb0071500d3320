//! CSV loader for feedback files.
//!
//! Parses a delimited file with a header row into [`Record`]s. Header names
//! are trimmed and lower-cased so `Sentiment ` and `sentiment` address the
//! same column; a repeated name gets a `.1`, `.2`, ... suffix. Data cells are
//! kept verbatim.

use crate::error::LoadError;
use crate::models::Record;
use csv::{ReaderBuilder, Trim};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// A parsed feedback file: its header and its rows.
#[derive(Debug, Clone, Default)]
pub struct FeedbackTable {
    /// Normalized column names in file order.
    pub columns: Vec<String>,
    /// One record per data row.
    pub records: Vec<Record>,
}

impl FeedbackTable {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the header contains `column`.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Configurable CSV parser.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    delimiter: u8,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse CSV text.
    pub fn parse_str(&self, content: &str) -> Result<FeedbackTable, LoadError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(Trim::Headers)
            .flexible(true)
            .from_reader(content.as_bytes());

        let columns = dedupe_headers(
            reader
                .headers()
                .map_err(LoadError::Headers)?
                .iter()
                .map(normalize_header),
        );

        let mut records = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let row = result.map_err(|source| LoadError::Row {
                row: index + 1,
                source,
            })?;

            // Cells past the header are dropped, missing trailing cells stay absent.
            let record = Record::from_pairs(
                columns
                    .iter()
                    .zip(row.iter())
                    .map(|(column, value)| (column.clone(), value.to_string())),
            );
            records.push(record);
        }

        debug!("Parsed {} rows across {} columns", records.len(), columns.len());

        Ok(FeedbackTable { columns, records })
    }

    /// Parse raw bytes, replacing invalid UTF-8 sequences.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<FeedbackTable, LoadError> {
        let content = String::from_utf8_lossy(bytes);
        self.parse_str(&content)
    }

    /// Read and parse a file without blocking the runtime.
    pub async fn load_path(&self, path: &Path) -> Result<FeedbackTable, LoadError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.parse_bytes(&bytes)
    }

    /// Load the dashboard dataset.
    ///
    /// A missing file yields an empty table so the dashboard still starts.
    pub fn load_dataset(&self, path: &Path) -> Result<FeedbackTable, LoadError> {
        if !path.exists() {
            warn!(
                "Dataset not found at {}, serving an empty dataset",
                path.display()
            );
            return Ok(FeedbackTable::default());
        }

        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = self.parse_bytes(&bytes)?;
        info!("Loaded dataset with {} records", table.len());
        Ok(table)
    }
}

fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// The first occurrence keeps its name; later ones become `name.1`, `name.2`.
fn dedupe_headers(headers: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::new();

    for header in headers {
        let n = seen.entry(header.clone()).or_insert(0);
        if *n == 0 {
            columns.push(header);
        } else {
            columns.push(format!("{}.{}", header, n));
        }
        *n += 1;
    }

    columns
}
