//! Text-completion oracle.
//!
//! The resolver talks to the model through the [`Oracle`] trait.
//! [`OpenAiOracle`] is the production implementation: a single chat-completions
//! call against any OpenAI-compatible endpoint.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use founderlookup_shared::{ErrorKind, FounderLookupError, OracleConfig, Result, resolve_api_key};

/// One completion request.
#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A text-completion backend.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Complete the request, returning the trimmed answer text.
    ///
    /// Failures carry the [`ErrorKind`] to persist in
    /// [`FounderLookupError::Oracle`].
    async fn complete(&self, request: &OracleRequest) -> Result<String>;

    /// Model identifier for logs.
    fn model(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> Message<'a> {
    fn system(content: &'a str) -> Self {
        Self {
            role: "system",
            content,
        }
    }

    fn user(content: &'a str) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// OpenAiOracle
// ---------------------------------------------------------------------------

/// Chat-completions client for OpenAI-compatible APIs.
pub struct OpenAiOracle {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    call_delay: Duration,
}

impl OpenAiOracle {
    /// Build a client, reading the API key from the configured env var.
    ///
    /// A missing key is a [`FounderLookupError::Config`] error.
    pub fn from_config(config: &OracleConfig) -> Result<Self> {
        let api_key = resolve_api_key(config)?;
        Self::with_api_key(config, api_key)
    }

    /// Build a client with an explicit API key.
    pub fn with_api_key(config: &OracleConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                FounderLookupError::oracle(
                    ErrorKind::OracleUnavailable,
                    format!("failed to build HTTP client: {e}"),
                )
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: config.model.clone(),
            call_delay: Duration::from_millis(config.call_delay_ms),
        })
    }

    async fn call(&self, request: &OracleRequest) -> Result<String> {
        let start = Instant::now();
        let body = ChatRequest {
            model: &self.model,
            messages: [Message::system(&request.system), Message::user(&request.user)],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_connect() {
                    ErrorKind::OracleUnavailable
                } else {
                    ErrorKind::OracleCallFailed
                };
                FounderLookupError::oracle(kind, format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "oracle API error");
            let kind = if status == StatusCode::SERVICE_UNAVAILABLE {
                ErrorKind::OracleUnavailable
            } else {
                ErrorKind::OracleCallFailed
            };
            return Err(FounderLookupError::oracle(kind, format!("HTTP {status}")));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            FounderLookupError::oracle(ErrorKind::Unexpected, format!("malformed response: {e}"))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                FounderLookupError::oracle(ErrorKind::Unexpected, "response has no choices")
            })?;

        debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis() as u64,
            "chat completion"
        );

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl Oracle for OpenAiOracle {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, request: &OracleRequest) -> Result<String> {
        let outcome = self.call(request).await;

        if !self.call_delay.is_zero() {
            tokio::time::sleep(self.call_delay).await;
        }

        outcome
    }

    fn model(&self) -> &str {
        &self.model
    }
}
