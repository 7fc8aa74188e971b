//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use founderlookup_core::{
    BatchConfig, FounderResolver, ProgressReporter, RunLog, StandardizeConfig, run_batch,
    standardize,
};
use founderlookup_shared::{
    AppConfig, FounderLookupError, ResumePolicy, StrategyKind, init_config, init_config_at,
    load_config, load_config_from, validate_config,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// FounderLookup: find out who founded the companies in a CSV.
#[derive(Parser)]
#[command(
    name = "founderlookup",
    version,
    about = "Enrich a CSV of companies with normalized founder names.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.founderlookup/founderlookup.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Evidence strategy selectable on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum StrategyArg {
    /// Ask the model directly.
    None,
    /// Ground the question with web search snippets.
    Search,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::None => StrategyKind::None,
            StrategyArg::Search => StrategyKind::Search,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Look up founders for every company in the input CSV.
    Run {
        /// Input CSV (defaults to input.path).
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output CSV; existing rows are kept and skipped.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column holding the company name.
        #[arg(long)]
        company_column: Option<String>,

        /// Evidence strategy (defaults to search.strategy).
        #[arg(long)]
        strategy: Option<StrategyArg>,

        /// Drop error-marked rows from the output and look them up again.
        #[arg(long)]
        retry_errors: bool,
    },

    /// Re-normalize the Founders column of an existing output CSV.
    Standardize {
        /// CSV to read (defaults to input.output_path).
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// CSV to write (defaults to input.standardized_path).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep error markers instead of replacing them with "Not Found".
        #[arg(long)]
        keep_errors: bool,
    },

    /// Look up a single company and print the result.
    Resolve {
        /// Company name.
        company: String,

        /// Evidence strategy (defaults to search.strategy).
        #[arg(long)]
        strategy: Option<StrategyArg>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "founderlookup=info",
        1 => "founderlookup=debug",
        _ => "founderlookup=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Run {
            input,
            output,
            company_column,
            strategy,
            retry_errors,
        } => {
            let mut config = load(config_path)?;
            if let Some(input) = input {
                config.input.path = input.to_string_lossy().into_owned();
            }
            if let Some(output) = output {
                config.input.output_path = output.to_string_lossy().into_owned();
            }
            if let Some(column) = company_column {
                config.input.company_column = column;
            }
            if let Some(strategy) = strategy {
                config.search.strategy = strategy.into();
            }
            if retry_errors {
                config.batch.resume_policy = ResumePolicy::RetryErrors;
            }
            validate_config(&config)?;
            cmd_run(&config).await
        }
        Command::Standardize {
            input,
            output,
            keep_errors,
        } => {
            let config = load(config_path)?;
            let mut settings = StandardizeConfig::from(&config);
            if let Some(input) = input {
                settings.input = input;
            }
            if let Some(output) = output {
                settings.output = output;
            }
            settings.keep_errors = keep_errors;
            cmd_standardize(&config, &settings)
        }
        Command::Resolve { company, strategy } => {
            let config = load(config_path)?;
            let strategy = strategy.map_or(config.search.strategy, StrategyKind::from);
            cmd_resolve(&config, &company, strategy).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn load(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(config: &AppConfig) -> Result<()> {
    let log = RunLog::start_session(
        &config.log.path,
        "Founder Lookup",
        config.log.truncate_on_start,
    );

    let resolver = match FounderResolver::from_config(config, config.search.strategy) {
        Ok(resolver) => resolver,
        Err(e @ FounderLookupError::Config { .. }) => {
            // Missing credential: log and exit successfully.
            warn!(error = %e, "oracle not configured, skipping lookup");
            log.record(format!("Oracle not configured, skipping lookup: {e}"));
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let batch = BatchConfig::from(config);
    info!(
        input = %batch.input.display(),
        output = %batch.output.display(),
        strategy = resolver.strategy_name(),
        "starting founder lookup"
    );

    let reporter = CliProgress::new();
    let summary = run_batch(&batch, &resolver, &log, &reporter).await?;

    println!();
    println!("  Founder lookup complete!");
    println!("  Resolved:  {}", summary.resolved);
    println!("  Names:     {}", summary.names_found);
    println!("  Not found: {}", summary.not_found);
    println!("  Errors:    {}", summary.errors);
    println!(
        "  Skipped:   {} existing, {} without company, {} malformed",
        summary.skipped_existing, summary.skipped_missing, summary.skipped_malformed
    );
    if summary.retried > 0 {
        println!("  Retried:   {}", summary.retried);
    }
    println!("  Output:    {}", batch.output.display());
    println!("  Time:      {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_standardize(config: &AppConfig, settings: &StandardizeConfig) -> Result<()> {
    let log = RunLog::start_session(&config.log.path, "Founder Standardization", false);
    info!(
        input = %settings.input.display(),
        output = %settings.output.display(),
        keep_errors = settings.keep_errors,
        "standardizing founders column"
    );

    let reporter = CliProgress::new();
    let summary = standardize(settings, &log, &reporter)?;

    println!();
    println!("  Standardization complete!");
    println!("  Rows:      {}", summary.rows);
    println!("  Changed:   {}", summary.changed);
    println!("  Names:     {}", summary.names);
    println!("  Not found: {}", summary.not_found);
    if summary.errors_kept > 0 {
        println!("  Errors:    {}", summary.errors_kept);
    }
    if summary.skipped_malformed > 0 {
        println!("  Malformed: {}", summary.skipped_malformed);
    }
    println!("  Output:    {}", settings.output.display());
    println!();

    Ok(())
}

async fn cmd_resolve(config: &AppConfig, company: &str, strategy: StrategyKind) -> Result<()> {
    let company = company.trim();
    if company.is_empty() {
        return Err(eyre!("company name must not be empty"));
    }

    let resolver = FounderResolver::from_config(config, strategy)?;
    info!(company, strategy = resolver.strategy_name(), "resolving single company");

    let result = resolver.resolve(company, &RunLog::disabled()).await;
    println!("{result}");
    Ok(())
}

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(path) => {
            init_config_at(path)?;
            path.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = load(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn row(&self, current: usize, total: usize, detail: &str) {
        self.spinner
            .set_message(format!("[{current}/{total}] {detail}"));
    }

    fn finished(&self, _message: &str) {
        self.spinner.finish_and_clear();
    }
}
