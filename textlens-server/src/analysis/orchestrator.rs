//! Analysis orchestrator.
//!
//! Runs the summary and metadata calls concurrently and joins them with the
//! locally computed keywords. Holds no concurrency limits of its own; callers
//! run it inside an admission slot.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument, warn};

use super::keywords::extract_keywords;
use super::AnalysisRecord;
use crate::config::AnalysisConfig;
use crate::llm::{LlmError, LlmProvider};
use crate::metrics;

/// Builds [`AnalysisRecord`]s from raw text
#[derive(Clone)]
pub struct Analyzer {
    provider: Arc<dyn LlmProvider>,
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn new(provider: Arc<dyn LlmProvider>, config: AnalysisConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Whether `text` is too short to be worth summarising
    pub fn is_short(&self, text: &str) -> bool {
        word_count(text) < self.config.min_summary_words
    }

    /// Analyze `text`.
    ///
    /// Summary and metadata are requested concurrently; the first failure
    /// fails the whole analysis and the other call is dropped. Short texts
    /// are used verbatim as their own summary without an LLM call.
    #[instrument(skip_all, fields(provider = self.provider.name(), words = word_count(text)))]
    pub async fn analyze(&self, text: &str) -> Result<AnalysisRecord, LlmError> {
        let summary = async {
            if self.is_short(text) {
                debug!("Short input, using text as summary");
                metrics::record_summary_skipped();
                Ok(text.to_string())
            } else {
                timed("summary", self.provider.generate_summary(text)).await
            }
        };
        let metadata = timed("metadata", self.provider.extract_metadata(text));

        let (summary, metadata) = tokio::try_join!(summary, metadata)?;
        let keywords = extract_keywords(text, self.config.max_keywords);

        Ok(AnalysisRecord::new(text, summary, metadata, keywords))
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Await one LLM call, recording its duration and outcome
async fn timed<T>(
    operation: &'static str,
    call: impl Future<Output = Result<T, LlmError>>,
) -> Result<T, LlmError> {
    let start = Instant::now();
    let result = call.await;
    metrics::record_llm_call(operation, llm_outcome(&result), start.elapsed());

    if let Err(e) = &result {
        warn!(operation, error = %e, "LLM call failed");
    }
    result
}

fn llm_outcome<T>(result: &Result<T, LlmError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(LlmError::Timeout(_)) => "timeout",
        Err(LlmError::Unavailable(_)) => "unavailable",
        Err(LlmError::MalformedResponse(_)) => "malformed",
    }
}
