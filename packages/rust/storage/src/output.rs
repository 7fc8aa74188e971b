//! Output writing: incremental appends and atomic rewrites.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use founderlookup_shared::{CompanyRecord, FounderLookupError, Result};
use tracing::{debug, info};

use crate::{InputTable, csv_error, has_content};

/// Append-only writer for the enriched output file.
///
/// Every row is flushed as soon as it is written so that an interrupted run
/// loses at most the row in flight.
pub struct OutputSink {
    path: PathBuf,
    columns: Vec<String>,
    writer: csv::Writer<File>,
    rows_written: usize,
}

impl OutputSink {
    /// Open `path` for appending with the given header.
    ///
    /// The header is written when the file is new or empty. An existing
    /// header must match `columns` exactly.
    pub fn open(path: &Path, columns: Vec<String>) -> Result<Self> {
        let existing = check_existing_header(path, &columns)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)
            .map_err(|e| FounderLookupError::io(path, e))?;

        if existing && !ends_with_newline(&mut file).map_err(|e| FounderLookupError::io(path, e))? {
            file.write_all(b"\n")
                .map_err(|e| FounderLookupError::io(path, e))?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if !existing {
            writer
                .write_record(&columns)
                .map_err(|e| csv_error(path, e))?;
            writer.flush().map_err(|e| FounderLookupError::io(path, e))?;
            debug!(path = %path.display(), "wrote output header");
        }

        Ok(Self {
            path: path.to_path_buf(),
            columns,
            writer,
            rows_written: 0,
        })
    }

    /// Output header, founders column last.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Append one row: the record's values for every non-founder column, then
    /// `founders`. Flushes before returning.
    pub fn append(&mut self, record: &CompanyRecord, founders: &str) -> Result<()> {
        let passthrough = &self.columns[..self.columns.len().saturating_sub(1)];
        let row: Vec<&str> = record
            .project(passthrough)
            .chain(std::iter::once(founders))
            .collect();

        self.writer
            .write_record(&row)
            .map_err(|e| csv_error(&self.path, e))?;
        self.writer
            .flush()
            .map_err(|e| FounderLookupError::io(&self.path, e))?;
        self.rows_written += 1;
        Ok(())
    }

    /// Rows appended through this handle.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

/// Check the header of an existing output file against `columns`.
///
/// Returns whether the file exists with content. A mismatching header is a
/// [`FounderLookupError::Validation`] error.
pub fn check_existing_header(path: &Path, columns: &[String]) -> Result<bool> {
    if !has_content(path)? {
        return Ok(false);
    }

    let table = InputTable::open(path, &[])?;
    if table.headers() != columns {
        return Err(FounderLookupError::validation(format!(
            "output header of {} is [{}], expected [{}]",
            path.display(),
            table.headers().join(", "),
            columns.join(", ")
        )));
    }
    Ok(true)
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

// ---------------------------------------------------------------------------
// Atomic rewrites
// ---------------------------------------------------------------------------

/// Write a complete table to `path` via a temp file and rename.
pub fn write_table_atomic(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.csv".to_string());
    let temp = path.with_file_name(format!(".{filename}.tmp"));

    let mut writer = csv::Writer::from_path(&temp).map_err(|e| csv_error(&temp, e))?;
    writer.write_record(headers).map_err(|e| csv_error(&temp, e))?;
    for row in rows {
        writer.write_record(row).map_err(|e| csv_error(&temp, e))?;
    }
    writer.flush().map_err(|e| FounderLookupError::io(&temp, e))?;
    drop(writer);

    std::fs::rename(&temp, path).map_err(|e| FounderLookupError::io(path, e))?;
    debug!(path = %path.display(), rows = rows.len(), "table written");
    Ok(())
}

/// Remove every row of `path` for which `should_drop` returns true, atomically.
///
/// Returns the number of rows removed. A missing or empty file is left alone.
pub fn drop_rows_where<F>(path: &Path, should_drop: F) -> Result<usize>
where
    F: Fn(&CompanyRecord) -> bool,
{
    if !has_content(path)? {
        return Ok(0);
    }

    let mut table = InputTable::open(path, &[])?;
    let headers = table.headers().to_vec();
    let mut kept: Vec<Vec<String>> = Vec::new();
    let mut removed = 0;

    for (line, record) in table.records() {
        let record = record.map_err(|e| {
            FounderLookupError::validation(format!("line {line} of {}: {e}", path.display()))
        })?;
        if should_drop(&record) {
            removed += 1;
        } else {
            kept.push(record.project(&headers).map(str::to_string).collect());
        }
    }

    if removed > 0 {
        write_table_atomic(path, &headers, &kept)?;
        info!(path = %path.display(), removed, "rewrote output without dropped rows");
    }
    Ok(removed)
}
