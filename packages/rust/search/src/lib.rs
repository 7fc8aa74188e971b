//! Web-search evidence gathering.
//!
//! Before asking the oracle, the resolver can ground its prompt with a few
//! search result snippets about the company. This crate fetches an HTML
//! results page for `"{company} founders"` and turns it into a text blob.
//! Transport failures never propagate out of [`EvidenceGatherer::gather`]:
//! they degrade to empty evidence.

mod parser;

use std::time::Duration;

use async_trait::async_trait;
use founderlookup_shared::{FounderLookupError, Result, SearchConfig};
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

pub use parser::{SNIPPET_DELIMITER, Snippet, format_evidence, parse_results};

/// Maximum number of redirects to follow for a search request.
const MAX_REDIRECTS: usize = 3;

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("FounderLookup/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Source of evidence text for one company.
#[async_trait]
pub trait EvidenceGatherer: Send + Sync {
    /// Evidence blob for `company`, or an empty string when there is none.
    async fn gather(&self, company: &str) -> String;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}

/// Gatherer that never finds anything.
pub struct NoEvidence;

#[async_trait]
impl EvidenceGatherer for NoEvidence {
    async fn gather(&self, _company: &str) -> String {
        String::new()
    }

    fn name(&self) -> &str {
        "none"
    }
}

// ---------------------------------------------------------------------------
// Search options
// ---------------------------------------------------------------------------

/// Runtime search settings.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Results page endpoint; the query goes in `q`.
    pub base_url: String,
    /// Maximum result blocks kept.
    pub max_results: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Pause after every request, in milliseconds.
    pub delay_ms: u64,
}

impl From<&SearchConfig> for SearchOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            max_results: config.max_results,
            timeout_secs: config.timeout_secs,
            delay_ms: config.delay_ms,
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

// ---------------------------------------------------------------------------
// SearchGatherer
// ---------------------------------------------------------------------------

/// Gathers evidence from an HTML search results page.
pub struct SearchGatherer {
    client: Client,
    opts: SearchOptions,
}

impl SearchGatherer {
    /// Create a gatherer with its own HTTP client.
    pub fn new(opts: SearchOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| {
                FounderLookupError::Transport(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, opts })
    }

    /// Search URL for a company.
    pub fn query_url(&self, company: &str) -> Result<Url> {
        let query = format!("{} founders", company.trim());
        Url::parse_with_params(&self.opts.base_url, &[("q", query.as_str())]).map_err(|e| {
            FounderLookupError::config(format!(
                "invalid search base URL '{}': {e}",
                self.opts.base_url
            ))
        })
    }

    /// Fetch and parse results, propagating transport errors.
    ///
    /// Sleeps the pacing delay after the request whether it succeeded or not.
    #[instrument(skip_all, fields(company = %company))]
    pub async fn fetch_snippets(&self, company: &str) -> Result<Vec<Snippet>> {
        let outcome = self.fetch_page(company).await;

        if self.opts.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.opts.delay_ms)).await;
        }

        let html = outcome?;
        let snippets = parse_results(&html, self.opts.max_results);
        debug!(count = snippets.len(), "parsed search results");
        Ok(snippets)
    }

    async fn fetch_page(&self, company: &str) -> Result<String> {
        let url = self.query_url(company)?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FounderLookupError::Transport(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FounderLookupError::Transport(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| FounderLookupError::Transport(format!("{url}: failed to read body: {e}")))
    }
}

#[async_trait]
impl EvidenceGatherer for SearchGatherer {
    async fn gather(&self, company: &str) -> String {
        match self.fetch_snippets(company).await {
            Ok(snippets) => format_evidence(&snippets),
            Err(e) => {
                warn!(company, error = %e, "search failed, continuing without evidence");
                String::new()
            }
        }
    }

    fn name(&self) -> &str {
        "search"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(base_url: String) -> SearchOptions {
        SearchOptions {
            base_url,
            max_results: 5,
            timeout_secs: 5,
            delay_ms: 0,
        }
    }

    fn load_fixture() -> String {
        std::fs::read_to_string("../../../fixtures/search/duckduckgo.html")
            .expect("read search fixture")
    }

    #[test]
    fn query_url_encodes_company() {
        let gatherer = SearchGatherer::new(options("https://search.example.com/html/".into()))
            .unwrap();
        let url = gatherer.query_url(" AT&T ").unwrap();
        assert_eq!(url.as_str(), "https://search.example.com/html/?q=AT%26T+founders");
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let gatherer = SearchGatherer::new(options("not a url".into())).unwrap();
        let err = gatherer.query_url("Acme").unwrap_err();
        assert!(matches!(err, FounderLookupError::Config { .. }));
    }

    #[tokio::test]
    async fn gather_with_mock_server() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/html/"))
            .and(wiremock::matchers::query_param("q", "Stripe founders"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(load_fixture()))
            .expect(1)
            .mount(&server)
            .await;

        let gatherer = SearchGatherer::new(options(format!("{}/html/", server.uri()))).unwrap();
        let evidence = gatherer.gather("Stripe").await;

        assert!(evidence.starts_with("Title: Stripe - Wikipedia\nSnippet: "));
        assert_eq!(evidence.matches(SNIPPET_DELIMITER).count(), 4);
        assert!(!evidence.contains("Sponsored"));
    }

    #[tokio::test]
    async fn gather_degrades_to_empty_on_server_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let gatherer = SearchGatherer::new(options(format!("{}/html/", server.uri()))).unwrap();
        assert_eq!(gatherer.gather("Acme").await, "");

        let err = gatherer.fetch_snippets("Acme").await.unwrap_err();
        assert!(matches!(err, FounderLookupError::Transport(_)));
    }

    #[tokio::test]
    async fn gather_degrades_to_empty_when_unreachable() {
        // Nothing listens on port 9 of localhost in test environments.
        let gatherer = SearchGatherer::new(options("http://127.0.0.1:9/html/".into())).unwrap();
        assert_eq!(gatherer.gather("Acme").await, "");
    }

    #[tokio::test]
    async fn gather_empty_results_page() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string("<html><body><div class=\"no-results\">No results.</div></body></html>"),
            )
            .mount(&server)
            .await;

        let gatherer = SearchGatherer::new(options(format!("{}/html/", server.uri()))).unwrap();
        assert_eq!(gatherer.gather("Nonexistent Co").await, "");
    }

    #[tokio::test]
    async fn no_evidence_is_always_empty() {
        assert_eq!(NoEvidence.gather("Acme").await, "");
        assert_eq!(NoEvidence.name(), "none");
    }
}
