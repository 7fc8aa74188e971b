//! Re-normalize the Founders column of an existing output file.
//!
//! Useful after the phrase table changes: older runs are brought to the
//! current canonical form without another round of lookups.

use std::path::PathBuf;

use tracing::{info, instrument, warn};

use founderlookup_normalize::{Classification, classify, normalize};
use founderlookup_shared::{AppConfig, FounderResult, Result};
use founderlookup_storage::{InputTable, write_table_atomic};

use crate::batch::ProgressReporter;
use crate::runlog::RunLog;

/// Settings for one standardize pass.
#[derive(Debug, Clone)]
pub struct StandardizeConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub company_column: String,
    pub founders_column: String,
    /// Keep error markers instead of collapsing them to the sentinel.
    pub keep_errors: bool,
}

impl From<&AppConfig> for StandardizeConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            input: PathBuf::from(&config.input.output_path),
            output: PathBuf::from(&config.input.standardized_path),
            company_column: config.input.company_column.clone(),
            founders_column: config.input.founders_column.clone(),
            keep_errors: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandardizeSummary {
    pub rows: usize,
    /// Cells whose value changed.
    pub changed: usize,
    pub names: usize,
    pub not_found: usize,
    pub errors_kept: usize,
    pub skipped_malformed: usize,
}

/// Rewrite every Founders cell in canonical form into `config.output`.
#[instrument(skip_all, fields(input = %config.input.display()))]
pub fn standardize(
    config: &StandardizeConfig,
    log: &RunLog,
    progress: &dyn ProgressReporter,
) -> Result<StandardizeSummary> {
    progress.phase("Reading table");
    let mut table = InputTable::open(
        &config.input,
        &[config.company_column.as_str(), config.founders_column.as_str()],
    )?;
    let headers = table.headers().to_vec();
    let records: Vec<_> = table.records().collect();
    log.record(format!(
        "Standardizing {} rows from {}",
        records.len(),
        config.input.display()
    ));

    progress.phase("Normalizing");
    let mut summary = StandardizeSummary::default();
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(records.len());
    let total = records.len();

    for (index, (line, record)) in records.into_iter().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                summary.skipped_malformed += 1;
                warn!(line, error = %e, "skipping malformed row");
                log.record(format!("Skipping malformed row at line {line}: {e}"));
                continue;
            }
        };

        let original = record.get(&config.founders_column).unwrap_or_default();
        let company = record.key(&config.company_column);
        let standardized = standardize_cell(original, company, config.keep_errors);

        match &standardized {
            FounderResult::Names(_) => summary.names += 1,
            FounderResult::NotFound => summary.not_found += 1,
            FounderResult::Error(_) => summary.errors_kept += 1,
        }

        let cell = standardized.to_string();
        if cell != original {
            summary.changed += 1;
        }

        let row = headers
            .iter()
            .map(|h| {
                if *h == config.founders_column {
                    cell.clone()
                } else {
                    record.get(h).unwrap_or_default().to_string()
                }
            })
            .collect();
        rows.push(row);
        summary.rows += 1;
        progress.row(index + 1, total, company.unwrap_or_default());
    }

    write_table_atomic(&config.output, &headers, &rows)?;

    let message = format!(
        "Standardized {} rows into {} ({} changed, {} with names, {} not found)",
        summary.rows,
        config.output.display(),
        summary.changed,
        summary.names,
        summary.not_found
    );
    log.record(&message);
    info!(rows = summary.rows, changed = summary.changed, "standardize complete");
    progress.finished(&message);

    Ok(summary)
}

/// Canonical form of one Founders cell.
fn standardize_cell(cell: &str, company: Option<&str>, keep_errors: bool) -> FounderResult {
    let Some(company) = company else {
        return FounderResult::NotFound;
    };
    if keep_errors {
        if let Classification::Error(kind) = classify(cell) {
            return FounderResult::Error(kind);
        }
    }
    normalize(cell, company)
}
