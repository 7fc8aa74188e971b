//! Founder resolution for a single company.
//!
//! [`FounderResolver`] owns the oracle and the evidence strategy chosen at
//! construction time. `resolve` never fails: oracle errors come back as
//! [`FounderResult::Error`] so they can be persisted and retried later.

use founderlookup_normalize::{Classification, classify, normalize};
use founderlookup_search::{EvidenceGatherer, SearchGatherer, SearchOptions};
use founderlookup_shared::{AppConfig, FounderResult, Result, StrategyKind};
use tracing::instrument;

use crate::oracle::{OpenAiOracle, Oracle, OracleRequest};
use crate::runlog::RunLog;

/// Appended to evidence cut at the character budget.
pub const TRUNCATION_MARKER: &str = "\n[... search results truncated ...]";

const PLAIN_SYSTEM: &str = "You are a helpful assistant that provides founder names.";

const GROUNDED_SYSTEM: &str = "You are a research assistant. Answer only from the search \
results provided. Reply with the founders' full names separated by commas, or with only \
the text 'Not Found' if the results do not name them.";

/// Evidence gathered before the oracle is asked.
pub enum EvidenceStrategy {
    /// Ask the oracle directly.
    None,
    /// Ground the question with search snippets; no evidence means not found.
    SearchSnippets(Box<dyn EvidenceGatherer>),
}

impl EvidenceStrategy {
    pub fn name(&self) -> &str {
        match self {
            Self::None => "none",
            Self::SearchSnippets(gatherer) => gatherer.name(),
        }
    }
}

/// Sampling and prompt budgets.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_evidence_chars: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ResolverSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            temperature: config.oracle.temperature,
            max_tokens: config.oracle.max_tokens,
            max_evidence_chars: config.search.max_evidence_chars,
        }
    }
}

/// Resolves one company name to a [`FounderResult`].
pub struct FounderResolver {
    oracle: Box<dyn Oracle>,
    strategy: EvidenceStrategy,
    settings: ResolverSettings,
}

impl FounderResolver {
    pub fn new(oracle: Box<dyn Oracle>, strategy: EvidenceStrategy, settings: ResolverSettings) -> Self {
        Self {
            oracle,
            strategy,
            settings,
        }
    }

    /// Production resolver: an [`OpenAiOracle`] plus the chosen evidence
    /// strategy. A missing API key is a `Config` error.
    pub fn from_config(config: &AppConfig, strategy: StrategyKind) -> Result<Self> {
        let oracle = OpenAiOracle::from_config(&config.oracle)?;
        let strategy = match strategy {
            StrategyKind::None => EvidenceStrategy::None,
            StrategyKind::Search => EvidenceStrategy::SearchSnippets(Box::new(
                SearchGatherer::new(SearchOptions::from(&config.search))?,
            )),
        };
        Ok(Self::new(Box::new(oracle), strategy, ResolverSettings::from(config)))
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn model(&self) -> &str {
        self.oracle.model()
    }

    /// Look up the founders of `company`.
    #[instrument(skip_all, fields(company = %company, strategy = %self.strategy.name()))]
    pub async fn resolve(&self, company: &str, log: &RunLog) -> FounderResult {
        match &self.strategy {
            EvidenceStrategy::None => {
                let request = self.request(PLAIN_SYSTEM, plain_prompt(company));
                self.ask(company, "plain", &request, log).await
            }
            EvidenceStrategy::SearchSnippets(gatherer) => {
                let evidence = gatherer.gather(company).await;
                if evidence.trim().is_empty() {
                    log.record(format!("{company}: search returned no evidence, marking Not Found"));
                    return FounderResult::NotFound;
                }
                log.record(format!(
                    "{company}: gathered {} chars of evidence via {}",
                    evidence.chars().count(),
                    gatherer.name()
                ));

                let evidence = truncate_evidence(&evidence, self.settings.max_evidence_chars);
                let request = self.request(GROUNDED_SYSTEM, grounded_prompt(company, &evidence));
                self.ask(company, "grounded", &request, log).await
            }
        }
    }

    fn request(&self, system: &str, user: String) -> OracleRequest {
        OracleRequest {
            system: system.to_string(),
            user,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        }
    }

    async fn ask(&self, company: &str, step: &str, request: &OracleRequest, log: &RunLog) -> FounderResult {
        let raw = match self.oracle.complete(request).await {
            Ok(raw) => raw,
            Err(e) => {
                let kind = e.persisted_kind();
                log.record(format!("{company}: {step} lookup failed ({kind}): {e}"));
                return FounderResult::Error(kind);
            }
        };

        let result = match classify(&raw) {
            Classification::Error(kind) => FounderResult::Error(kind),
            Classification::NotFound => FounderResult::NotFound,
            Classification::Usable(text) => normalize(&text, company),
        };

        log.record(format!(
            "{company}: {step} lookup -> {} ({result})",
            result.outcome()
        ));
        result
    }
}

/// Ungrounded question.
pub fn plain_prompt(company: &str) -> String {
    format!(
        "Who are the founders of the company '{company}'? Please list their full names, \
         separated by commas. If you cannot find the founders, please respond with only \
         the text 'Not Found'."
    )
}

/// Question grounded in search snippets.
pub fn grounded_prompt(company: &str, evidence: &str) -> String {
    format!(
        "Search results about '{company}':\n\n{evidence}\n\nBased only on these results, who \
         founded '{company}'? List the founders' full names separated by commas. If the \
         results do not say, respond with only the text 'Not Found'."
    )
}

/// Cut `text` to at most `max_chars` characters, appending [`TRUNCATION_MARKER`]
/// when anything was removed.
pub fn truncate_evidence(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use founderlookup_search::EvidenceGatherer;
    use founderlookup_shared::{ErrorKind, FounderLookupError, Result};

    use crate::oracle::{Oracle, OracleRequest};

    /// Oracle that replays scripted answers and records prompts.
    #[derive(Default)]
    pub(crate) struct ScriptedOracle {
        answers: Mutex<VecDeque<Result<String>>>,
        pub(crate) prompts: Mutex<Vec<String>>,
        pub(crate) calls: AtomicUsize,
    }

    impl ScriptedOracle {
        pub(crate) fn answering(answers: &[&str]) -> Self {
            let oracle = Self::default();
            for answer in answers {
                oracle.push_ok(answer);
            }
            oracle
        }

        pub(crate) fn push_ok(&self, answer: &str) {
            self.answers.lock().unwrap().push_back(Ok(answer.to_string()));
        }

        pub(crate) fn push_err(&self, kind: ErrorKind) {
            self.answers
                .lock()
                .unwrap()
                .push_back(Err(FounderLookupError::oracle(kind, "scripted failure")));
        }
    }

    #[async_trait]
    impl Oracle for ScriptedOracle {
        async fn complete(&self, request: &OracleRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(request.user.clone());
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("Not Found".to_string()))
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    #[async_trait]
    impl<T: Oracle> Oracle for std::sync::Arc<T> {
        async fn complete(&self, request: &OracleRequest) -> Result<String> {
            (**self).complete(request).await
        }

        fn model(&self) -> &str {
            (**self).model()
        }
    }

    /// Gatherer returning a fixed blob.
    pub(crate) struct FixedEvidence(pub(crate) String);

    #[async_trait]
    impl EvidenceGatherer for FixedEvidence {
        async fn gather(&self, _company: &str) -> String {
            self.0.clone()
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use founderlookup_search::NoEvidence;
    use founderlookup_shared::ErrorKind;

    use super::test_support::{FixedEvidence, ScriptedOracle};
    use super::*;

    fn resolver(oracle: Arc<ScriptedOracle>, strategy: EvidenceStrategy) -> FounderResolver {
        FounderResolver::new(Box::new(oracle), strategy, ResolverSettings::default())
    }

    #[tokio::test]
    async fn plain_strategy_normalizes_answer() {
        let oracle = Arc::new(ScriptedOracle::answering(&[
            "The founders of Acme are Jane Doe and John Smith.",
        ]));
        let resolver = resolver(oracle.clone(), EvidenceStrategy::None);

        let result = resolver.resolve("Acme", &RunLog::disabled()).await;
        assert_eq!(result.to_string(), "Jane Doe, John Smith");

        let prompts = oracle.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("Who are the founders of the company 'Acme'?"));
    }

    #[tokio::test]
    async fn oracle_failure_becomes_error_marker() {
        let oracle = Arc::new(ScriptedOracle::default());
        oracle.push_err(ErrorKind::OracleCallFailed);
        let resolver = resolver(oracle, EvidenceStrategy::None);

        let result = resolver.resolve("Acme", &RunLog::disabled()).await;
        assert_eq!(result, FounderResult::Error(ErrorKind::OracleCallFailed));
        assert_eq!(result.to_string(), "Error_API_Call_Failed");
    }

    #[tokio::test]
    async fn empty_evidence_skips_oracle() {
        let oracle = Arc::new(ScriptedOracle::answering(&["Jane Doe"]));
        let resolver = resolver(
            oracle.clone(),
            EvidenceStrategy::SearchSnippets(Box::new(NoEvidence)),
        );

        let result = resolver.resolve("Acme", &RunLog::disabled()).await;
        assert_eq!(result, FounderResult::NotFound);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn grounded_prompt_embeds_evidence() {
        let oracle = Arc::new(ScriptedOracle::answering(&["Founded by Patrick Collison & John Collison"]));
        let evidence = "Title: Stripe - Wikipedia\nSnippet: Founded by Patrick and John Collison.";
        let resolver = resolver(
            oracle.clone(),
            EvidenceStrategy::SearchSnippets(Box::new(FixedEvidence(evidence.into()))),
        );

        let result = resolver.resolve("Stripe", &RunLog::disabled()).await;
        assert_eq!(result.to_string(), "Patrick Collison, John Collison");

        let prompts = oracle.prompts.lock().unwrap();
        assert!(prompts[0].contains(evidence));
        assert!(!prompts[0].contains(TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn grounded_not_found_answer_is_not_found() {
        let oracle = Arc::new(ScriptedOracle::answering(&["I couldn't find that in the results."]));
        let resolver = resolver(
            oracle,
            EvidenceStrategy::SearchSnippets(Box::new(FixedEvidence("Title: x\nSnippet: y".into()))),
        );

        let result = resolver.resolve("Acme", &RunLog::disabled()).await;
        assert_eq!(result, FounderResult::NotFound);
    }

    #[tokio::test]
    async fn marker_answer_is_persisted_as_error() {
        let oracle = Arc::new(ScriptedOracle::answering(&["Error_Unexpected_API"]));
        let resolver = resolver(oracle, EvidenceStrategy::None);

        let result = resolver.resolve("Acme", &RunLog::disabled()).await;
        assert_eq!(result, FounderResult::Error(ErrorKind::Unexpected));
    }

    #[test]
    fn truncation_is_char_safe() {
        assert_eq!(truncate_evidence("short", 10), "short");
        assert_eq!(truncate_evidence("exact", 5), "exact");

        let cut = truncate_evidence("Zoë Müller founded it", 3);
        assert_eq!(cut, format!("Zoë{TRUNCATION_MARKER}"));
    }

    #[test]
    fn strategy_names() {
        assert_eq!(EvidenceStrategy::None.name(), "none");
        assert_eq!(
            EvidenceStrategy::SearchSnippets(Box::new(FixedEvidence(String::new()))).name(),
            "fixed"
        );
    }
}
