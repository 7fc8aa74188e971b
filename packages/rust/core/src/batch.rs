//! Batch driver: input table → resolver → incremental output.
//!
//! Rows are processed strictly in order, one at a time. Each resolved row is
//! appended and flushed before the next lookup starts, so an interrupted run
//! resumes by skipping every company already present in the output.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, instrument, warn};

use founderlookup_normalize::{Classification, classify};
use founderlookup_shared::{AppConfig, FounderLookupError, FounderResult, ResumePolicy, Result};
use founderlookup_storage::{
    InputTable, OutputSink, ProcessedKeys, check_existing_header, drop_rows_where, output_columns,
};

use crate::resolver::FounderResolver;
use crate::runlog::RunLog;

/// Settings for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub company_column: String,
    pub founders_column: String,
    pub resume_policy: ResumePolicy,
}

impl From<&AppConfig> for BatchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            input: PathBuf::from(&config.input.path),
            output: PathBuf::from(&config.input.output_path),
            company_column: config.input.company_column.clone(),
            founders_column: config.input.founders_column.clone(),
            resume_policy: config.batch.resume_policy,
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Rows resolved and written during this run.
    pub resolved: usize,
    pub names_found: usize,
    pub not_found: usize,
    pub errors: usize,
    /// Rows whose company was already in the output.
    pub skipped_existing: usize,
    /// Rows without a company name.
    pub skipped_missing: usize,
    /// Rows the CSV reader could not parse.
    pub skipped_malformed: usize,
    /// Error rows removed from the output for another attempt.
    pub retried: usize,
    pub elapsed: std::time::Duration,
}

impl BatchSummary {
    fn count(&mut self, result: &FounderResult) {
        self.resolved += 1;
        match result {
            FounderResult::Names(_) => self.names_found += 1,
            FounderResult::NotFound => self.not_found += 1,
            FounderResult::Error(_) => self.errors += 1,
        }
    }
}

/// Progress callback for long-running table passes.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each input row.
    fn row(&self, current: usize, total: usize, detail: &str);
    /// Called once the pass completes.
    fn finished(&self, message: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn row(&self, _current: usize, _total: usize, _detail: &str) {}
    fn finished(&self, _message: &str) {}
}

/// Run the lookup over every row of the input table.
///
/// Fatal errors: missing company column (nothing is written), output header
/// mismatch, and I/O or CSV writer failures. Everything per-row is logged and
/// counted instead.
#[instrument(skip_all, fields(input = %config.input.display(), output = %config.output.display()))]
pub async fn run_batch(
    config: &BatchConfig,
    resolver: &FounderResolver,
    log: &RunLog,
    progress: &dyn ProgressReporter,
) -> Result<BatchSummary> {
    let start = Instant::now();
    let mut summary = BatchSummary::default();

    progress.phase("Reading input");
    let mut table = match InputTable::open(&config.input, &[config.company_column.as_str()]) {
        Ok(table) => table,
        Err(e) => {
            log.record(format!("Error: {e}"));
            return Err(e);
        }
    };
    let columns = output_columns(table.headers(), &config.founders_column);
    let rows: Vec<_> = table.records().collect();
    log.record(format!(
        "Read {} rows from {}",
        rows.len(),
        config.input.display()
    ));

    check_existing_header(&config.output, &columns)?;

    if config.resume_policy == ResumePolicy::RetryErrors {
        let founders_column = config.founders_column.as_str();
        summary.retried = drop_rows_where(&config.output, |record| {
            record
                .get(founders_column)
                .is_some_and(|cell| matches!(classify(cell), Classification::Error(_)))
        })?;
        if summary.retried > 0 {
            log.record(format!(
                "Removed {} error rows from {} for retry",
                summary.retried,
                config.output.display()
            ));
        }
    }

    let mut processed = ProcessedKeys::load(&config.output, &config.company_column)?;
    if !processed.is_empty() {
        log.record(format!(
            "Resuming: {} companies already in {}",
            processed.len(),
            config.output.display()
        ));
    }

    let mut sink = OutputSink::open(&config.output, columns)?;
    log.record(format!(
        "Looking up founders with strategy '{}' (model {})",
        resolver.strategy_name(),
        resolver.model()
    ));

    progress.phase("Resolving founders");
    let total = rows.len();
    for (index, (line, record)) in rows.into_iter().enumerate() {
        let current = index + 1;

        let record = match record {
            Ok(record) => record,
            Err(e) => {
                summary.skipped_malformed += 1;
                warn!(line, error = %e, "skipping malformed row");
                log.record(format!("Skipping malformed row at line {line}: {e}"));
                progress.row(current, total, "malformed row");
                continue;
            }
        };

        let Some(company) = record.key(&config.company_column).map(str::to_string) else {
            summary.skipped_missing += 1;
            let err = FounderLookupError::MissingField {
                row: line,
                field: config.company_column.clone(),
            };
            warn!(error = %err, "skipping row without company");
            log.record(format!("Skipping row: {err}"));
            progress.row(current, total, "missing company");
            continue;
        };

        if processed.contains(&company) {
            summary.skipped_existing += 1;
            progress.row(current, total, &company);
            continue;
        }

        log.record(format!("Processing: {company}"));
        let result = resolver.resolve(&company, log).await;
        sink.append(&record, &result.to_string())?;
        processed.insert(company.clone());
        summary.count(&result);
        log.record(format!("  -> {company}: {result}"));
        progress.row(current, total, &company);
    }

    summary.elapsed = start.elapsed();
    let message = format!(
        "Resolved {} companies ({} with names, {} not found, {} errors); skipped {} existing, {} without company, {} malformed",
        summary.resolved,
        summary.names_found,
        summary.not_found,
        summary.errors,
        summary.skipped_existing,
        summary.skipped_missing,
        summary.skipped_malformed
    );
    log.record(&message);
    info!(
        resolved = summary.resolved,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "batch complete"
    );
    progress.finished(&message);

    Ok(summary)
}
