//! Application configuration for FounderLookup.
//!
//! User config lives at `~/.founderlookup/founderlookup.toml` unless a path is
//! given explicitly. CLI flags override config file values, which override
//! defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FounderLookupError, Result};
use crate::types::FOUNDERS_COLUMN;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "founderlookup.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".founderlookup";

// ---------------------------------------------------------------------------
// Config structs (matching founderlookup.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input/output file settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Text-completion oracle settings.
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Evidence search settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Batch behaviour.
    #[serde(default)]
    pub batch: BatchSettings,

    /// Run log settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// `[input]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// CSV file with one company per row.
    #[serde(default = "default_input_path")]
    pub path: String,

    /// Where enriched rows are appended.
    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Where `standardize` writes its cleaned copy.
    #[serde(default = "default_standardized_path")]
    pub standardized_path: String,

    /// Header of the company-name column (matched after trimming).
    #[serde(default = "default_company_column")]
    pub company_column: String,

    /// Header of the appended founders column.
    #[serde(default = "default_founders_column")]
    pub founders_column: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
            output_path: default_output_path(),
            standardized_path: default_standardized_path(),
            company_column: default_company_column(),
            founders_column: default_founders_column(),
        }
    }
}

fn default_input_path() -> String {
    "companies.csv".into()
}
fn default_output_path() -> String {
    "companies_with_founders.csv".into()
}
fn default_standardized_path() -> String {
    "companies_founders_standardized.csv".into()
}
fn default_company_column() -> String {
    "Company".into()
}
fn default_founders_column() -> String {
    FOUNDERS_COLUMN.into()
}

/// `[oracle]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_oracle_base_url")]
    pub base_url: String,

    /// Chat model used for lookups.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature; kept low for factual answers.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion length budget.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_oracle_timeout")]
    pub timeout_secs: u64,

    /// Pause after every completion call, in milliseconds.
    #[serde(default = "default_oracle_delay")]
    pub call_delay_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_oracle_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_oracle_timeout(),
            call_delay_ms: default_oracle_delay(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_oracle_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    150
}
fn default_oracle_timeout() -> u64 {
    30
}
fn default_oracle_delay() -> u64 {
    2_000
}

/// Which evidence the resolver gathers before asking the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Ask the oracle directly.
    None,
    /// Ground the prompt with web search snippets.
    #[default]
    Search,
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Evidence strategy.
    #[serde(default)]
    pub strategy: StrategyKind,

    /// HTML search endpoint; the query goes in the `q` parameter.
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Maximum result blocks kept per query.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,

    /// Pause after every search request, in milliseconds.
    #[serde(default = "default_search_delay")]
    pub delay_ms: u64,

    /// Character budget for evidence embedded in the prompt.
    #[serde(default = "default_max_evidence_chars")]
    pub max_evidence_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            base_url: default_search_base_url(),
            max_results: default_max_results(),
            timeout_secs: default_search_timeout(),
            delay_ms: default_search_delay(),
            max_evidence_chars: default_max_evidence_chars(),
        }
    }
}

fn default_search_base_url() -> String {
    "https://html.duckduckgo.com/html/".into()
}
fn default_max_results() -> usize {
    5
}
fn default_search_timeout() -> u64 {
    10
}
fn default_search_delay() -> u64 {
    1_000
}
fn default_max_evidence_chars() -> usize {
    4_000
}

/// How rows already present in the output are treated on resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResumePolicy {
    /// Every existing row counts as processed, error rows included.
    #[default]
    SkipExisting,
    /// Error-marked rows are dropped from the output and looked up again.
    RetryErrors,
}

/// `[batch]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Resume behaviour for previously written rows.
    #[serde(default)]
    pub resume_policy: ResumePolicy,
}

/// `[log]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Run log file path.
    #[serde(default = "default_log_path")]
    pub path: String,

    /// Start each session with an empty log file.
    #[serde(default = "default_true")]
    pub truncate_on_start: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
            truncate_on_start: true,
        }
    }
}

fn default_log_path() -> String {
    "founder_lookup_log.txt".into()
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.founderlookup/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| FounderLookupError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.founderlookup/founderlookup.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| FounderLookupError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        FounderLookupError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Reject settings that would make a run meaningless.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.input.company_column.trim().is_empty() {
        return Err(FounderLookupError::config("input.company_column must not be empty"));
    }
    if config.input.founders_column.trim().is_empty() {
        return Err(FounderLookupError::config("input.founders_column must not be empty"));
    }
    if config.search.max_results == 0 {
        return Err(FounderLookupError::config("search.max_results must be at least 1"));
    }
    if !(0.0..=2.0).contains(&config.oracle.temperature) {
        return Err(FounderLookupError::config(format!(
            "oracle.temperature must be within 0.0..=2.0, got {}",
            config.oracle.temperature
        )));
    }
    Ok(())
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| FounderLookupError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    init_config_at(&path)?;
    Ok(path)
}

/// Write the default config to an explicit path.
pub fn init_config_at(path: &Path) -> Result<()> {
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| FounderLookupError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| FounderLookupError::io(path, e))?;
    tracing::info!(?path, "created default config file");
    Ok(())
}

/// Read the oracle API key from the env var named in the config.
pub fn resolve_api_key(config: &OracleConfig) -> Result<String> {
    let var_name = &config.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(FounderLookupError::config(format!(
            "oracle API key not found. Set the {var_name} environment variable \
             (a .env file in the working directory is also read)."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("company_column"));
        assert!(toml_str.contains("OPENAI_API_KEY"));
        assert!(toml_str.contains("skip-existing"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.input.company_column, "Company");
        assert_eq!(parsed.input.founders_column, "Founders");
        assert_eq!(parsed.search.max_results, 5);
        assert_eq!(parsed.search.strategy, StrategyKind::Search);
        assert_eq!(parsed.oracle.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[input]
path = "unicorns.csv"

[search]
strategy = "none"

[batch]
resume_policy = "retry-errors"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.input.path, "unicorns.csv");
        assert_eq!(config.input.company_column, "Company");
        assert_eq!(config.search.strategy, StrategyKind::None);
        assert_eq!(config.search.delay_ms, 1_000);
        assert_eq!(config.batch.resume_policy, ResumePolicy::RetryErrors);
        assert!(config.log.truncate_on_start);
    }

    #[test]
    fn validation_rejects_zero_results() {
        let mut config = AppConfig::default();
        config.search.max_results = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_results"));
    }

    #[test]
    fn validation_rejects_blank_company_column() {
        let mut config = AppConfig::default();
        config.input.company_column = "  ".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn init_then_load_from_path() {
        let dir = std::env::temp_dir().join(format!("fl-config-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("founderlookup.toml");

        init_config_at(&path).unwrap();
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.log.path, "founder_lookup_log.txt");
        assert_eq!(config.oracle.model, "gpt-3.5-turbo");

        std::fs::write(&path, "[input\n").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, FounderLookupError::Config { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn api_key_missing() {
        let mut config = OracleConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.api_key_env = "FL_TEST_NONEXISTENT_KEY_12345".into();
        let result = resolve_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
