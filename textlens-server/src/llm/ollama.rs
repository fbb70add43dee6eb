//! Ollama adapter for the LLM provider boundary.
//!
//! Talks to the native `/api/generate` endpoint with streaming disabled.
//! Each call races the HTTP exchange against the configured timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};

use super::{ExtractedMetadata, LlmError, LlmProvider};
use crate::config::LlmConfig;
use crate::types::ollama::{GenerateRequest, GenerateResponse, ModelOptions, TagsResponse};

const SUMMARY_SYSTEM_PROMPT: &str = "You summarize documents. Reply with a concise summary \
of one to three sentences. Do not add commentary or headings.";

const METADATA_SYSTEM_PROMPT: &str = "You classify documents. Reply with a single JSON object \
with exactly these keys: \"title\" (a short title string), \"topics\" (an array of exactly 3 \
short topic strings) and \"sentiment\" (one of \"positive\", \"neutral\", \"negative\").";

/// LLM provider backed by an Ollama server
#[derive(Clone)]
pub struct OllamaProvider {
    /// HTTP client
    client: Client,
    /// Ollama base URL, without trailing slash
    base_url: String,
    /// Model used for every call
    model: String,
    /// Optional bearer token
    api_key: Option<String>,
    /// Bound applied to each call
    timeout: Duration,
}

impl OllamaProvider {
    /// Create a new provider from configuration
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .build()
            .map_err(|e| LlmError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
        })
    }

    /// Get the Ollama base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Run one non-streaming generation, bounded by the configured timeout
    async fn generate(&self, request: GenerateRequest) -> Result<String, LlmError> {
        let call = async {
            let response = self
                .request(reqwest::Method::POST, "/api/generate")
                .json(&request)
                .send()
                .await
                .map_err(|e| self.transport_error(e))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| self.transport_error(e))?;

            if !status.is_success() {
                return Err(status_error(status, &body));
            }

            let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
                LlmError::MalformedResponse(format!("unexpected generate payload: {e}"))
            })?;
            debug!(tokens = ?parsed.eval_count, "Generate complete");
            Ok(parsed.response)
        };

        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs_f64(), "LLM call timed out");
                Err(LlmError::Timeout(self.timeout))
            }
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else if e.is_decode() {
            LlmError::MalformedResponse(e.to_string())
        } else {
            LlmError::Unavailable(e.to_string())
        }
    }
}

fn status_error(status: StatusCode, body: &str) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LlmError::Unavailable(format!("authentication failed (status {status})"))
        }
        _ => LlmError::Unavailable(format!("backend returned status {status}: {}", body.trim())),
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    #[instrument(skip(self, text), fields(model = %self.model, chars = text.len()))]
    async fn generate_summary(&self, text: &str) -> Result<String, LlmError> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
            system: Some(SUMMARY_SYSTEM_PROMPT.to_string()),
            format: None,
            options: Some(ModelOptions {
                temperature: Some(0.2),
                num_predict: None,
            }),
            stream: false,
        };

        let summary = self.generate(request).await?;
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(LlmError::MalformedResponse("empty summary".to_string()));
        }
        Ok(summary.to_string())
    }

    #[instrument(skip(self, text), fields(model = %self.model, chars = text.len()))]
    async fn extract_metadata(&self, text: &str) -> Result<ExtractedMetadata, LlmError> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
            system: Some(METADATA_SYSTEM_PROMPT.to_string()),
            format: Some(serde_json::Value::String("json".to_string())),
            options: Some(ModelOptions {
                temperature: Some(0.0),
                num_predict: None,
            }),
            stream: false,
        };

        let raw = self.generate(request).await?;
        ExtractedMetadata::from_llm_json(&raw)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), LlmError> {
        let call = async {
            let response = self
                .request(reqwest::Method::GET, "/api/tags")
                .send()
                .await
                .map_err(|e| self.transport_error(e))?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(status_error(status, &body));
            }

            let tags: TagsResponse = response.json().await.map_err(|e| {
                LlmError::MalformedResponse(format!("unexpected tags payload: {e}"))
            })?;
            if !tags.models.iter().any(|m| m.name == self.model) {
                warn!(model = %self.model, available = tags.models.len(), "Model not pulled on backend");
            }
            Ok(())
        };

        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or(Err(LlmError::Timeout(self.timeout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = OllamaProvider::new(&LlmConfig::default()).unwrap();
        assert_eq!(provider.base_url(), "http://localhost:11434");
        assert_eq!(provider.timeout(), Duration::from_secs(30));
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = LlmConfig {
            base_url: "http://192.168.1.100:11434/".to_string(),
            ..LlmConfig::default()
        };
        let provider = OllamaProvider::new(&config).unwrap();
        assert_eq!(provider.base_url(), "http://192.168.1.100:11434");
    }

    #[test]
    fn test_status_error_categories() {
        assert_eq!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            LlmError::Unavailable("authentication failed (status 401 Unauthorized)".to_string())
        );
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            LlmError::Unavailable(msg) if msg.contains("boom")
        ));
    }
}
