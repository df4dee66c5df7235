//! LLM client: transport, retry, and structured-response decoding.
//!
//! One [`ThemeExtractor::extract`] call covers the whole contract: send the
//! prompt to an OpenAI-compatible chat-completions endpoint, retry transport
//! failures with exponential backoff, and decode the body into a
//! [`Prediction`]. Every failure mode comes back as a [`CallOutcome`], never
//! as a panic or an error the caller has to unwind past the run.

use crate::config::EndpointConfig;
use crate::response::parse_prediction;
use crate::types::{CallOutcome, FailureKind, Prediction};
use crate::{log_debug, log_error, log_warn};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

/// Typed failure for one extraction attempt.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Network, timeout, or server-side failure; worth retrying.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The endpoint rejected the request; retrying cannot help.
    #[error("request rejected: {0}")]
    Request(String),
    /// Transport succeeded but the body held no valid themes payload.
    #[error("unparseable response: {0}")]
    Parse(String),
}

impl ExtractionError {
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) => FailureKind::Transport,
            Self::Request(_) => FailureKind::Request,
            Self::Parse(_) => FailureKind::Parse,
        }
    }

    /// Only transport-class failures are retried.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<ExtractionError> for CallOutcome {
    fn from(err: ExtractionError) -> Self {
        Self::Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Transport seam: anything that can turn a prompt into raw completion text.
///
/// The production implementation is [`ChatCompletionsBackend`]; tests swap in
/// scripted fakes to drive the retry loop deterministically.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ExtractionError>;
}

/// Retry schedule for transport failures.
///
/// Delays double from `base_delay_ms` with jitter applied. A zero base delay
/// produces an all-zero schedule, which is what tests run with.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// Schedule with no waiting between attempts.
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay_ms: 0,
        }
    }

    fn delays(&self) -> impl Iterator<Item = Duration> {
        // from_millis(2) doubles per step; the factor scales the first delay
        // up to base_delay_ms.
        ExponentialBackoff::from_millis(2)
            .factor(self.base_delay_ms / 2)
            .map(jitter)
    }
}

/// Client for the OpenAI-compatible `/chat/completions` interface.
pub struct ChatCompletionsBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionsBackend {
    pub fn new(endpoint: &EndpointConfig) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(endpoint.timeout_secs))
            .build()
            .map_err(|e| ExtractionError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: endpoint.base_url.trim_end_matches('/').to_string(),
            api_key: endpoint.api_key.clone(),
            model: endpoint.model.clone(),
            temperature: endpoint.temperature,
            max_tokens: endpoint.max_tokens,
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatTurn,
}

#[derive(Deserialize)]
struct ChatTurn {
    content: Option<String>,
}

#[async_trait]
impl CompletionBackend for ChatCompletionsBackend {
    async fn complete(&self, prompt: &str) -> Result<String, ExtractionError> {
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let url = format!("{}/chat/completions", self.base_url);
        log_debug!("POST {} (model: {})", url, self.model);

        let mut request = self.client.post(&url).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await.map_err(classify_send_error)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }

        let envelope: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Parse(format!("malformed completion envelope: {e}")))?;

        envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ExtractionError::Parse("completion carried no message content".to_string())
            })
    }
}

fn classify_send_error(err: reqwest::Error) -> ExtractionError {
    if err.is_builder() {
        ExtractionError::Request(format!("invalid request: {err}"))
    } else if err.is_timeout() {
        ExtractionError::Transport(format!("request timed out: {err}"))
    } else {
        ExtractionError::Transport(format!("connection failed: {err}"))
    }
}

fn classify_status(status: StatusCode, body: &str) -> ExtractionError {
    let summary = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", body.chars().take(200).collect::<String>())
    };

    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        ExtractionError::Transport(summary)
    } else {
        ExtractionError::Request(summary)
    }
}

/// Turns a prompt into a validated [`CallOutcome`].
pub struct ThemeExtractor {
    backend: Box<dyn CompletionBackend>,
    policy: RetryPolicy,
}

impl ThemeExtractor {
    pub fn new(backend: Box<dyn CompletionBackend>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    /// Builds an extractor over the configured HTTP endpoint.
    pub fn from_config(config: &crate::config::Config) -> Result<Self, ExtractionError> {
        let backend = ChatCompletionsBackend::new(&config.endpoint)?;
        Ok(Self::new(Box::new(backend), config.retry_policy()))
    }

    /// Runs one extraction to completion.
    ///
    /// Transport failures retry up to `max_attempts` with backoff; request
    /// and parse failures resolve immediately. The result is always a
    /// [`CallOutcome`]; this method does not fail.
    pub async fn extract(&self, prompt: &str) -> CallOutcome {
        let mut delays = self.policy.delays();
        let mut attempt: u32 = 1;

        loop {
            match self.attempt(prompt).await {
                Ok(prediction) => {
                    log_debug!(
                        "extraction succeeded on attempt {} with {} theme(s)",
                        attempt,
                        prediction.len()
                    );
                    return CallOutcome::Success(prediction);
                }
                Err(err) if err.is_retryable() && attempt < self.policy.max_attempts => {
                    let delay = delays.next().unwrap_or_default();
                    log_warn!(
                        "attempt {}/{} failed: {}; retrying in {:?}",
                        attempt,
                        self.policy.max_attempts,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    log_error!("extraction failed on attempt {}: {}", attempt, err);
                    return err.into();
                }
            }
        }
    }

    async fn attempt(&self, prompt: &str) -> Result<Prediction, ExtractionError> {
        let raw = self.backend.complete(prompt).await?;
        parse_prediction(&raw)
    }
}
