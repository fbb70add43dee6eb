//! Shared helpers for the router integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tokio::sync::Semaphore;
use tower::ServiceExt;

use textlens_core::AdmissionConfig;
use textlens_server::llm::{ExtractedMetadata, LlmError, LlmProvider, Sentiment};
use textlens_server::store::AnalysisStore;
use textlens_server::{build_router, AppConfig, AppState};

/// Scripted LLM provider with call counters, failure injection and an
/// optional gate that holds every call until permits are added.
pub struct MockProvider {
    pub summary_calls: AtomicUsize,
    pub metadata_calls: AtomicUsize,
    failure: Mutex<Option<LlmError>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            summary_calls: AtomicUsize::new(0),
            metadata_calls: AtomicUsize::new(0),
            failure: Mutex::new(None),
            gate: None,
        }
    }

    /// Calls block until `gate` has a permit
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    /// Make every following call fail with `error` (or succeed again with `None`)
    pub fn fail_with(&self, error: Option<LlmError>) {
        *self.failure.lock().unwrap() = error;
    }

    pub fn total_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst) + self.metadata_calls.load(Ordering::SeqCst)
    }

    async fn pass_gate(&self) -> Result<(), LlmError> {
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.expect("gate closed");
        }
        match self.failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_summary(&self, text: &str) -> Result<String, LlmError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await?;
        let preview: String = text.split_whitespace().take(4).collect::<Vec<_>>().join(" ");
        Ok(format!("Summary of: {preview}"))
    }

    async fn extract_metadata(&self, _text: &str) -> Result<ExtractedMetadata, LlmError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await?;
        Ok(ExtractedMetadata {
            title: "Mock title".to_string(),
            topics: vec![
                "Renewable Energy".to_string(),
                "policy".to_string(),
                "economics".to_string(),
            ],
            sentiment: Sentiment::Positive,
        })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        Ok(())
    }
}

/// Config with small, test-friendly limits
pub fn test_config(max_concurrent: usize, max_queue_size: usize) -> AppConfig {
    AppConfig {
        max_text_chars: 500,
        admission: AdmissionConfig::new(max_concurrent, max_queue_size).unwrap(),
        ..AppConfig::default()
    }
}

/// Router backed by an in-memory store and `provider`
pub async fn test_app(provider: Arc<MockProvider>, config: AppConfig) -> (Router, Arc<AppState>) {
    let store = AnalysisStore::in_memory().await.unwrap();
    let state = Arc::new(AppState::new(config, provider, store));
    (build_router(state.clone()), state)
}

pub fn post_json(uri: &str, body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Send one request and decode the JSON body (Null for an empty body)
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Text long enough to get an LLM summary under the default threshold
pub fn long_text() -> String {
    "Solar and wind projects keep getting cheaper, and grid operators across Europe \
     are now planning storage build-outs to absorb the midday surplus they produce."
        .to_string()
}

/// Yield until `condition` holds
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
