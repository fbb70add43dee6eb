//! LLM provider boundary.
//!
//! The analysis orchestrator only sees [`LlmProvider`]. Every call settles
//! within the provider's timeout and fails with exactly one [`LlmError`]
//! category, so a misbehaving backend can never pin an admission slot.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod ollama;

pub use ollama::OllamaProvider;

/// Number of topics kept from a metadata response
pub const TOPIC_COUNT: usize = 3;

/// Failure categories surfaced by a provider
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    /// The call did not settle within the configured bound
    #[error("LLM request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// Backend unreachable, rejected our credentials, or answered with an error status
    #[error("LLM backend unavailable: {0}")]
    Unavailable(String),

    /// Backend answered but the payload could not be used
    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),
}

/// Capabilities the orchestrator needs from an LLM backend
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short identifier used in logs and metrics
    fn name(&self) -> &str;

    /// Produce a short prose summary of `text`
    async fn generate_summary(&self, text: &str) -> Result<String, LlmError>;

    /// Classify `text` into a title, topics and a sentiment
    async fn extract_metadata(&self, text: &str) -> Result<ExtractedMetadata, LlmError>;

    /// Check the backend answers at all
    async fn health_check(&self) -> Result<(), LlmError>;
}

/// Overall tone of a text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            other => Err(format!("unknown sentiment {other:?}")),
        }
    }
}

/// Metadata produced by the LLM for one text
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedMetadata {
    pub title: String,
    pub topics: Vec<String>,
    pub sentiment: Sentiment,
}

#[derive(Deserialize)]
struct RawMetadata {
    title: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
    sentiment: Option<String>,
}

impl ExtractedMetadata {
    /// Parse the JSON object a model returned for a metadata prompt.
    ///
    /// Tolerates a surrounding markdown code fence. Keeps the first
    /// [`TOPIC_COUNT`] non-blank topics; a missing title, fewer topics than
    /// that, or an unknown sentiment is a malformed response.
    pub fn from_llm_json(raw: &str) -> Result<Self, LlmError> {
        let body = strip_code_fence(raw);
        let parsed: RawMetadata = serde_json::from_str(body)
            .map_err(|e| LlmError::MalformedResponse(format!("metadata is not valid JSON: {e}")))?;

        let title = parsed
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| LlmError::MalformedResponse("metadata has no title".to_string()))?;

        let topics: Vec<String> = parsed
            .topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .take(TOPIC_COUNT)
            .collect();
        if topics.len() < TOPIC_COUNT {
            return Err(LlmError::MalformedResponse(format!(
                "metadata has {} topics, expected {TOPIC_COUNT}",
                topics.len()
            )));
        }

        let sentiment = parsed
            .sentiment
            .ok_or_else(|| LlmError::MalformedResponse("metadata has no sentiment".to_string()))?
            .parse::<Sentiment>()
            .map_err(LlmError::MalformedResponse)?;

        Ok(Self {
            title,
            topics,
            sentiment,
        })
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
