//! Error types for FounderLookup.
//!
//! Library crates use [`FounderLookupError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use crate::types::ErrorKind;

/// Top-level error type for all FounderLookup operations.
#[derive(Debug, thiserror::Error)]
pub enum FounderLookupError {
    /// Configuration loading or validation error (including a missing credential).
    #[error("config error: {message}")]
    Config { message: String },

    /// HTTP failure while gathering search evidence.
    #[error("transport error: {0}")]
    Transport(String),

    /// Text-completion call failed; `kind` is what gets persisted.
    #[error("oracle error ({kind}): {message}")]
    Oracle { kind: ErrorKind, message: String },

    /// A required column is missing from a tabular file.
    #[error("input schema error: {message}")]
    InputSchema { message: String },

    /// A row lacks a required field value.
    #[error("row {row}: missing {field}")]
    MissingField { row: usize, field: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// CSV reading or writing error.
    #[error("csv error: {0}")]
    Csv(String),

    /// Data validation error (header mismatch, invalid settings, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FounderLookupError>;

impl FounderLookupError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an oracle error of the given kind.
    pub fn oracle(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self::Oracle {
            kind,
            message: msg.into(),
        }
    }

    /// Create an input schema error from any displayable message.
    pub fn input_schema(msg: impl Into<String>) -> Self {
        Self::InputSchema {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The error kind to persist when this error ends a lookup.
    ///
    /// Oracle errors carry their own kind; anything else is `Unexpected`.
    pub fn persisted_kind(&self) -> ErrorKind {
        match self {
            Self::Oracle { kind, .. } => *kind,
            _ => ErrorKind::Unexpected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = FounderLookupError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = FounderLookupError::input_schema("column 'Company' not found");
        assert!(err.to_string().contains("'Company'"));

        let err = FounderLookupError::MissingField {
            row: 4,
            field: "Company".into(),
        };
        assert_eq!(err.to_string(), "row 4: missing Company");
    }

    #[test]
    fn oracle_error_keeps_kind() {
        let err = FounderLookupError::oracle(ErrorKind::OracleUnavailable, "HTTP 503");
        assert_eq!(err.persisted_kind(), ErrorKind::OracleUnavailable);
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[test]
    fn non_oracle_errors_persist_as_unexpected() {
        let err = FounderLookupError::Transport("timeout".into());
        assert_eq!(err.persisted_kind(), ErrorKind::Unexpected);
    }
}
