use crate::circuit_breaker::CircuitBreaker;
use crate::traits::*;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Chat-completions client for any OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAICompatibleProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    max_retries: u32,
    temperature: f32,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl OpenAICompatibleProvider {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self::with_timeout(base_url, api_key, Duration::from_secs(60))
    }

    pub fn with_timeout(base_url: String, api_key: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url,
            api_key,
            max_retries: 2,
            temperature: 0.2,
            circuit_breaker: Arc::new(CircuitBreaker::default()),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn request_body(&self, request: &InferenceRequest) -> serde_json::Value {
        let mut body = json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": self.temperature,
        });

        if let Some(format) = &request.response_format {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {
                    "name": format.name,
                    "schema": format.schema,
                    "strict": false
                }
            });
        }

        body
    }

    fn retry_delay_for_error(&self, attempt: u32, err: &ProviderError) -> Duration {
        let msg = err.to_string().to_lowercase();
        if msg.contains("rate limit") || msg.contains("429") {
            if let Some(seconds) = extract_retry_seconds(&msg) {
                return Duration::from_secs(seconds.min(90));
            }
            return Duration::from_secs((2_u64.saturating_pow(attempt + 1)).min(30));
        }
        Duration::from_millis((250_u64.saturating_mul(2_u64.saturating_pow(attempt))).min(5000))
    }

    async fn complete_once(&self, request: &InferenceRequest) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        debug!("inference url={} model={}", url, request.model);

        let mut req_builder = self.client.post(&url).json(&self.request_body(request));
        if let Some(api_key) = &self.api_key {
            req_builder = req_builder.bearer_auth(api_key);
        }

        let response = req_builder.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ProviderError::Http("Network connection failed".to_string())
            } else {
                ProviderError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            let msg = match status.as_u16() {
                401 => format!("Authentication failed (401). Details: {}", body),
                404 => format!("Invalid endpoint (404). Details: {}", body),
                429 => format!("Rate limit exceeded (429). Details: {}", body),
                _ => format!("{}: {}", status, body),
            };
            return Err(ProviderError::Api(msg));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let choice = json["choices"]
            .get(0)
            .ok_or_else(|| ProviderError::Parse("No choices in response".to_string()))?;

        choice["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ProviderError::Parse("Response message has no content".to_string()))
    }
}

#[async_trait]
impl InferenceService for OpenAICompatibleProvider {
    async fn complete(&self, request: &InferenceRequest) -> Result<String, ProviderError> {
        self.circuit_breaker.check()?;

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            debug!("inference attempt {}/{}", attempt + 1, self.max_retries + 1);
            match self.complete_once(request).await {
                Ok(text) => {
                    self.circuit_breaker.record_success();
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Inference call failed (attempt {}): {}", attempt + 1, e);
                    let delay = self.retry_delay_for_error(attempt, &e);
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        self.circuit_breaker.record_failure();
        Err(last_error.unwrap_or_else(|| ProviderError::Http("Unknown error".to_string())))
    }

    fn name(&self) -> &str {
        "OpenAI Compatible"
    }
}

fn extract_retry_seconds(msg: &str) -> Option<u64> {
    for token in msg.split(|ch: char| !ch.is_ascii_alphanumeric() && ch != '.') {
        if let Some(stripped) = token.strip_suffix('s') {
            if let Ok(v) = stripped.parse::<u64>() {
                if v > 0 {
                    return Some(v);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> InferenceRequest {
        InferenceRequest {
            model: "test-model".to_string(),
            messages: vec![ChatMessage::system("plan"), ChatMessage::user("go")],
            response_format: Some(ResponseFormat {
                name: "plan".to_string(),
                schema: json!({"type": "object"}),
            }),
        }
    }

    #[test]
    fn test_request_body_shape() {
        let provider = OpenAICompatibleProvider::new("http://localhost".to_string(), None);
        let body = provider.request_body(&request());
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "plan");
    }

    #[test]
    fn test_extract_retry_seconds() {
        assert_eq!(extract_retry_seconds("retry after 12s please"), Some(12));
        assert_eq!(extract_retry_seconds("no hint"), None);
    }

    #[tokio::test]
    async fn test_complete_returns_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"ok\":true}"}}]
            })))
            .mount(&server)
            .await;

        let provider =
            OpenAICompatibleProvider::new(server.uri(), Some("secret".to_string())).with_max_retries(0);
        let text = provider.complete(&request()).await.unwrap();
        assert_eq!(text, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn test_api_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let provider = OpenAICompatibleProvider::new(server.uri(), None).with_max_retries(0);
        let err = provider.complete(&request()).await.unwrap_err();
        match err {
            ProviderError::Api(msg) => assert!(msg.contains("401")),
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_choices_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let provider = OpenAICompatibleProvider::new(server.uri(), None).with_max_retries(0);
        assert!(matches!(
            provider.complete(&request()).await,
            Err(ProviderError::Parse(_))
        ));
    }
}
