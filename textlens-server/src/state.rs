//! Application state shared across all handlers.

use std::sync::Arc;

use textlens_core::AdmissionQueue;

use crate::analysis::Analyzer;
use crate::config::AppConfig;
use crate::llm::LlmProvider;
use crate::store::AnalysisStore;

/// Application state shared across all handlers
pub struct AppState {
    /// Configuration fixed at startup
    pub config: AppConfig,

    /// Bounded admission for analyses; the analyze handler is its only caller
    pub queue: AdmissionQueue,

    /// Orchestrates the LLM calls of one analysis
    pub analyzer: Analyzer,

    /// Record persistence and search
    pub store: AnalysisStore,

    /// LLM backend, kept for health checks
    pub provider: Arc<dyn LlmProvider>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: AppConfig, provider: Arc<dyn LlmProvider>, store: AnalysisStore) -> Self {
        Self {
            queue: AdmissionQueue::new(config.admission),
            analyzer: Analyzer::new(provider.clone(), config.analysis.clone()),
            store,
            provider,
            config,
        }
    }
}
