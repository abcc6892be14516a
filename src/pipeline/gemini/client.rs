use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::types::{GenerateContentBody, GenerateContentResponse, GenerateRequest, ModelClient};
use super::GeminiError;
use crate::config::StratifyConfig;

/// Longest error body kept from a failed provider response.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Async HTTP client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    /// Create a client. Fails fast when the key is blank, before any request.
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, GeminiError> {
        if api_key.trim().is_empty() {
            return Err(GeminiError::MissingCredential);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GeminiError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn from_config(config: &StratifyConfig) -> Result<Self, GeminiError> {
        Self::new(&config.base_url, config.api_key(), config.timeout_secs)
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    fn map_send_error(&self, e: reqwest::Error) -> GeminiError {
        if e.is_connect() {
            GeminiError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            GeminiError::Timeout(self.timeout_secs)
        } else {
            GeminiError::HttpClient(e.to_string())
        }
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GeminiError> {
        let url = self.endpoint(&request.model);
        let body = GenerateContentBody::from_request(request);
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api {
                status: status.as_u16(),
                body: truncate_chars(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::ResponseParsing(e.to_string()))?;

        let text = parsed.answer_text()?;

        tracing::debug!(
            model = %request.model,
            elapsed_ms = %start.elapsed().as_millis(),
            response_len = text.len(),
            "Model call complete"
        );

        Ok(text)
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

// ──────────────────────────────────────────────
// MockModelClient (testing)
// ──────────────────────────────────────────────

/// Mock model client for testing.
///
/// Replays scripted responses in order and records every request it sees.
/// Once the script runs out, calls fail with a connection error.
pub struct MockModelClient {
    responses: Mutex<VecDeque<Result<String, GeminiError>>>,
    requests: Mutex<Vec<GenerateRequest>>,
    delay: Option<Duration>,
}

impl MockModelClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_response(self, response: &str) -> Self {
        self.push(Ok(response.to_string()));
        self
    }

    pub fn with_error(self, error: GeminiError) -> Self {
        self.push(Err(error));
        self
    }

    /// Wait this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue another scripted response.
    pub fn push(&self, response: Result<String, GeminiError>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl Default for MockModelClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GeminiError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.responses.lock().ok().and_then(|mut q| q.pop_front());
        next.unwrap_or_else(|| Err(GeminiError::Connection("mock script exhausted".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::gemini::types::Part;

    fn request() -> GenerateRequest {
        GenerateRequest::json("model", vec![Part::text("prompt")], 0.2)
    }

    #[test]
    fn gemini_client_constructor() {
        let client = GeminiClient::new("https://example.test", "key", 60).unwrap();
        assert_eq!(client.base_url, "https://example.test");
        assert_eq!(client.timeout_secs, 60);
    }

    #[test]
    fn gemini_client_trims_trailing_slash() {
        let client = GeminiClient::new("https://example.test/", "key", 60).unwrap();
        assert_eq!(
            client.endpoint("gemini-2.5-flash"),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn blank_key_fails_before_any_request() {
        let result = GeminiClient::new("https://example.test", "  ", 60);
        assert!(matches!(result, Err(GeminiError::MissingCredential)));
    }

    #[test]
    fn from_config_uses_config_values() {
        let mut config = StratifyConfig::with_api_key("k");
        config.base_url = "http://localhost:9999".into();
        config.timeout_secs = 5;
        let client = GeminiClient::from_config(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:9999");
        assert_eq!(client.timeout_secs, 5);
    }

    #[test]
    fn truncate_keeps_short_bodies() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
    }

    #[tokio::test]
    async fn mock_replays_in_order_and_records() {
        let client = MockModelClient::new()
            .with_response("first")
            .with_response("second");

        assert_eq!(client.generate(&request()).await.unwrap(), "first");
        assert_eq!(client.generate(&request()).await.unwrap(), "second");
        assert_eq!(client.call_count(), 2);
        assert_eq!(client.requests()[0].model, "model");
    }

    #[tokio::test]
    async fn mock_replays_errors() {
        let client = MockModelClient::new().with_error(GeminiError::EmptyResponse);
        assert!(matches!(
            client.generate(&request()).await,
            Err(GeminiError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn exhausted_mock_fails() {
        let client = MockModelClient::new();
        assert!(matches!(
            client.generate(&request()).await,
            Err(GeminiError::Connection(_))
        ));
    }
}
