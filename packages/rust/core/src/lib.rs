//! Core lookup workflows for FounderLookup.
//!
//! This crate ties together the oracle client, evidence gathering, name
//! normalization, and CSV storage into end-to-end workflows
//! ([`batch::run_batch`], [`standardize::standardize`]).

pub mod batch;
pub mod oracle;
pub mod resolver;
pub mod runlog;
pub mod standardize;

pub use batch::{BatchConfig, BatchSummary, ProgressReporter, SilentProgress, run_batch};
pub use oracle::{OpenAiOracle, Oracle, OracleRequest};
pub use resolver::{EvidenceStrategy, FounderResolver, ResolverSettings};
pub use runlog::RunLog;
pub use standardize::{StandardizeConfig, StandardizeSummary, standardize};
