//! Tabular (CSV) storage layer.
//!
//! Input and output artifacts are CSV files with a header row. This crate
//! reads company rows, tracks which companies an output file already holds,
//! and appends enriched rows one at a time.
//!
//! **Access rules:**
//! - Input files are only read, once per run, via [`InputTable`]
//! - Output files are append-only via [`OutputSink`]; the only rewrite is
//!   [`drop_rows_where`], which replaces the file atomically

mod output;

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use founderlookup_shared::{CompanyRecord, FounderLookupError, Result};
use tracing::debug;

pub use output::{OutputSink, check_existing_header, drop_rows_where, write_table_atomic};

// ---------------------------------------------------------------------------
// InputTable
// ---------------------------------------------------------------------------

/// A CSV file opened for row-by-row reading.
pub struct InputTable {
    path: PathBuf,
    headers: Vec<String>,
    reader: csv::Reader<File>,
}

impl InputTable {
    /// Open `path` and check that every `required` column is present.
    ///
    /// Header names are trimmed before matching.
    pub fn open(path: &Path, required: &[&str]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| csv_error(path, e))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| csv_error(path, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        for column in required {
            if !headers.iter().any(|h| h == column) {
                return Err(FounderLookupError::input_schema(format!(
                    "column '{column}' not found in {} (available: {})",
                    path.display(),
                    headers.join(", ")
                )));
            }
        }

        debug!(path = %path.display(), columns = headers.len(), "opened table");

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            reader,
        })
    }

    /// Trimmed header names in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Iterate data rows as `(line_number, record)`.
    ///
    /// Line numbers are 1-based and count the header as line 1. A malformed
    /// row yields an error for that row only.
    pub fn records(&mut self) -> impl Iterator<Item = (usize, Result<CompanyRecord>)> + '_ {
        let headers = &self.headers;
        let path = &self.path;
        self.reader
            .records()
            .enumerate()
            .map(move |(index, result)| {
                let line = index + 2;
                let record = result
                    .map(|row| {
                        let values: Vec<&str> = row.iter().collect();
                        CompanyRecord::new(headers.as_slice(), values.as_slice())
                    })
                    .map_err(|e| csv_error(path, e));
                (line, record)
            })
    }
}

// ---------------------------------------------------------------------------
// Output schema and processed keys
// ---------------------------------------------------------------------------

/// Output header: input columns in order without `founders_column`, then
/// `founders_column` last.
pub fn output_columns(input_headers: &[String], founders_column: &str) -> Vec<String> {
    input_headers
        .iter()
        .filter(|h| h.as_str() != founders_column)
        .cloned()
        .chain(std::iter::once(founders_column.to_string()))
        .collect()
}

/// Company keys already present in an output file.
///
/// Filled once at startup; afterwards it only grows as rows are appended.
#[derive(Debug, Clone, Default)]
pub struct ProcessedKeys {
    keys: HashSet<String>,
}

impl ProcessedKeys {
    /// Read the company column of `path`. A missing or empty file yields an
    /// empty set.
    pub fn load(path: &Path, company_column: &str) -> Result<Self> {
        if !has_content(path)? {
            return Ok(Self::default());
        }

        let mut table = InputTable::open(path, &[company_column])?;
        let mut keys = HashSet::new();
        for (line, record) in table.records() {
            match record {
                Ok(record) => {
                    if let Some(key) = record.key(company_column) {
                        keys.insert(key.to_string());
                    }
                }
                Err(e) => debug!(line, error = %e, "unreadable output row ignored"),
            }
        }

        debug!(path = %path.display(), keys = keys.len(), "loaded processed keys");
        Ok(Self { keys })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Record a key whose row was just appended.
    pub fn insert(&mut self, key: impl Into<String>) {
        self.keys.insert(key.into());
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Whether `path` exists and is non-empty.
pub fn has_content(path: &Path) -> Result<bool> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len() > 0),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(FounderLookupError::io(path, e)),
    }
}

pub(crate) fn csv_error(path: &Path, e: csv::Error) -> FounderLookupError {
    FounderLookupError::Csv(format!("{}: {e}", path.display()))
}
