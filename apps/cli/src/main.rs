//! FounderLookup CLI: enrich a company list with founder names.
//!
//! Reads a CSV of companies, asks a language model (optionally grounded with
//! web search snippets) who founded each one, and writes normalized names to
//! an output CSV that can be resumed at any time.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
