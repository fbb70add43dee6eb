//! Ollama API types.
//!
//! Based on the official Ollama API documentation:
//! https://github.com/ollama/ollama/blob/main/docs/api.md
//!
//! Only the non-streaming `/api/generate` call and `/api/tags` are used.

use serde::{Deserialize, Serialize};

/// Request body for POST /api/generate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model name (required)
    pub model: String,

    /// The prompt to generate a response for
    pub prompt: String,

    /// System prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Format of the response: "json" or JSON schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<serde_json::Value>,

    /// Model-specific options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ModelOptions>,

    /// Always false here; the whole answer is needed before parsing
    pub stream: bool,
}

/// Response from POST /api/generate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Model name
    pub model: String,

    /// Timestamp
    #[serde(default)]
    pub created_at: String,

    /// Generated text
    #[serde(default)]
    pub response: String,

    /// Whether generation is complete
    pub done: bool,

    /// Number of tokens generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u32>,
}

/// Model parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelOptions {
    /// Temperature (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
}

/// Response from GET /api/tags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagsResponse {
    pub models: Vec<ModelInfo>,
}

/// Model information from /api/tags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}
