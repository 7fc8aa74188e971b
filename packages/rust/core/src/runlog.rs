//! Append-only human-readable run log.
//!
//! Every message goes to `tracing` and, when a file is configured, to a plain
//! text file as `"{timestamp} - {message}"`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use founderlookup_shared::RunId;
use tracing::{info, warn};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Handle to the run log of the current session.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: Option<PathBuf>,
    run_id: RunId,
}

impl RunLog {
    /// Start a session: optionally truncate the file, then write the session
    /// header line tagged with a fresh [`RunId`].
    pub fn start_session(path: impl AsRef<Path>, title: &str, truncate: bool) -> Self {
        let path = path.as_ref().to_path_buf();

        if truncate {
            if let Err(e) = std::fs::write(&path, "") {
                warn!(path = %path.display(), error = %e, "failed to truncate run log");
            }
        }

        let log = Self {
            path: Some(path),
            run_id: RunId::new(),
        };
        log.write_line(&format!(
            "{title} - Session Start: {} [run {}]",
            timestamp(),
            log.run_id
        ));
        info!(title, run_id = %log.run_id, "session started");
        log
    }

    /// A log that only records to tracing.
    pub fn disabled() -> Self {
        Self {
            path: None,
            run_id: RunId::new(),
        }
    }

    /// Record one message.
    pub fn record(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        info!("{message}");
        self.write_line(&format!("{} - {message}", timestamp()));
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// The log file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn write_line(&self, line: &str) {
        let Some(path) = &self.path else {
            return;
        };

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| writeln!(file, "{line}"));

        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "failed to write run log");
        }
    }
}

fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}
