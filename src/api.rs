//! Language model API interaction with exponential backoff retry logic.
//!
//! # Architecture
//!
//! - [`AskAsync`]: core trait defining async LLM interaction
//! - [`GeminiClient`]: calls the Gemini `generateContent` REST endpoint
//! - [`RetryAsk`]: decorator that adds retry logic to any `AskAsync` implementation
//!
//! # Retry Strategy
//!
//! - Only transport errors, HTTP 429 and HTTP 5xx are retried
//! - Exponential backoff starting at 1 second, capped at 30 seconds
//! - Random jitter (0-250ms) added to every delay

use crate::config::ModelConfig;
use crate::error::EnrichmentError;
use crate::utils::truncate_for_log;
use rand::{Rng, rng};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Trait for async LLM interaction.
///
/// Implementors send a prompt to a model and return its raw text reply.
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send text to the LLM and receive a response.
    async fn ask(&self, text: &str) -> Result<Self::Response, EnrichmentError>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    /// Delay before retrying after `attempt` failures, without jitter.
    fn backoff_delay(&self, attempt: usize) -> StdDuration {
        // Capped so the shift cannot overflow.
        let exponent = attempt.saturating_sub(1).min(16) as u32;
        self.base_delay
            .saturating_mul(1 << exponent)
            .min(self.max_delay)
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

/// Whether another attempt could plausibly succeed.
fn is_transient(e: &EnrichmentError) -> bool {
    match e {
        EnrichmentError::Http(_) => true,
        EnrichmentError::Api { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, EnrichmentError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries || !is_transient(&e) {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "ask() giving up"
                        );
                        return Err(e);
                    }

                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = self.backoff_delay(attempt) + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    config: ModelConfig,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client, config: &ModelConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl AskAsync for GeminiClient {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(model = %self.config.model))]
    async fn ask(&self, text: &str) -> Result<Self::Response, EnrichmentError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(EnrichmentError::MissingApiKey)?;

        let t0 = Instant::now();
        let body = json!({ "contents": [{ "parts": [{ "text": text }] }] });
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .timeout(StdDuration::from_secs(self.config.request_timeout_secs))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                elapsed_ms = t0.elapsed().as_millis(),
                status = status.as_u16(),
                body = %truncate_for_log(&body, 300),
                "API call failed"
            );
            return Err(EnrichmentError::Api {
                status: status.as_u16(),
                body: truncate_for_log(&body, 300),
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let reply: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if reply.trim().is_empty() {
            return Err(EnrichmentError::EmptyResponse);
        }

        debug!(response_preview = %truncate_for_log(&reply, 300), "Model replied");
        info!(elapsed_ms = t0.elapsed().as_millis(), bytes = reply.len(), "API call succeeded");
        Ok(reply)
    }
}

/// Call the model with exponential backoff retry logic.
#[instrument(level = "info", skip_all)]
pub async fn ask_with_backoff<T>(
    client: T,
    prompt: &str,
    max_retries: usize,
) -> Result<T::Response, EnrichmentError>
where
    T: AskAsync + fmt::Debug,
{
    let t0 = Instant::now();
    let api = RetryAsk::new(client, max_retries, StdDuration::from_secs(1));
    let res = api.ask(prompt).await;
    let dt = t0.elapsed();

    match &res {
        Ok(_) => info!(elapsed_ms_total = dt.as_millis(), "ask_with_backoff succeeded"),
        Err(e) => {
            error!(elapsed_ms_total = dt.as_millis(), error = %e, "ask_with_backoff failed")
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Fails with the given status a fixed number of times, then succeeds.
    #[derive(Debug)]
    struct Flaky {
        failures: usize,
        status: u16,
        calls: AtomicUsize,
    }

    impl AskAsync for &Flaky {
        type Response = String;

        async fn ask(&self, _text: &str) -> Result<String, EnrichmentError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(EnrichmentError::Api {
                    status: self.status,
                    body: String::new(),
                })
            } else {
                Ok("ok".to_string())
            }
        }
    }

    fn model_config(server: &MockServer) -> ModelConfig {
        ModelConfig {
            api_key: Some("test-key".to_string()),
            api_base: server.uri(),
            ..ModelConfig::default()
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_server_error() {
        let flaky = Flaky {
            failures: 1,
            status: 503,
            calls: AtomicUsize::new(0),
        };
        let api = RetryAsk::new(&flaky, 2, StdDuration::from_millis(1));
        assert_eq!(api.ask("prompt").await.unwrap(), "ok");
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_backoff_delay_doubles_then_caps() {
        let flaky = Flaky {
            failures: 0,
            status: 503,
            calls: AtomicUsize::new(0),
        };
        let api = RetryAsk::new(&flaky, 100, StdDuration::from_secs(1));
        assert_eq!(api.backoff_delay(1), StdDuration::from_secs(1));
        assert_eq!(api.backoff_delay(3), StdDuration::from_secs(4));
        assert_eq!(api.backoff_delay(6), StdDuration::from_secs(30));
        assert_eq!(api.backoff_delay(40), StdDuration::from_secs(30));
        assert_eq!(api.backoff_delay(usize::MAX), StdDuration::from_secs(30));
    }

    #[tokio::test]
    async fn test_retry_does_not_repeat_client_errors() {
        let flaky = Flaky {
            failures: 5,
            status: 400,
            calls: AtomicUsize::new(0),
        };
        let api = RetryAsk::new(&flaky, 3, StdDuration::from_millis(1));
        assert!(api.ask("prompt").await.is_err());
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gemini_client_extracts_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "[{\"translatedTitle\":" }, { "text": "\"Hi\"}]" }] }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(reqwest::Client::new(), &model_config(&server));
        let reply = client.ask("prompt").await.unwrap();
        assert_eq!(reply, "[{\"translatedTitle\":\"Hi\"}]");
    }

    #[tokio::test]
    async fn test_gemini_client_reports_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let client = GeminiClient::new(reqwest::Client::new(), &model_config(&server));
        match client.ask("prompt").await {
            Err(EnrichmentError::Api { status, body }) => {
                assert_eq!(status, 403);
                assert!(body.contains("API key not valid"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_gemini_client_requires_api_key() {
        let client = GeminiClient::new(reqwest::Client::new(), &ModelConfig::default());
        assert!(matches!(
            client.ask("prompt").await,
            Err(EnrichmentError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn test_empty_candidates_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(reqwest::Client::new(), &model_config(&server));
        assert!(matches!(
            client.ask("prompt").await,
            Err(EnrichmentError::EmptyResponse)
        ));
    }
}
