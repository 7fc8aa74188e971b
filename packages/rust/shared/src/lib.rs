//! Shared types, error model, and configuration for FounderLookup.
//!
//! This crate is the foundation depended on by all other FounderLookup crates.
//! It provides:
//! - [`FounderLookupError`], the unified error type
//! - Domain types ([`FounderResult`], [`ErrorKind`], [`CompanyRecord`], [`RunId`])
//! - Configuration ([`AppConfig`] and its sections, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BatchSettings, InputConfig, LogConfig, OracleConfig, ResumePolicy, SearchConfig,
    StrategyKind, config_dir, config_file_path, init_config, init_config_at, load_config, load_config_from,
    resolve_api_key, validate_config,
};
pub use error::{FounderLookupError, Result};
pub use types::{
    CompanyRecord, ErrorKind, FOUNDERS_COLUMN, FounderResult, NOT_FOUND_SENTINEL, RunId,
};
