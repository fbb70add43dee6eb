//! Text analysis endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::analysis::AnalysisRecord;
use crate::error::ApiError;
use crate::metrics::{self, RequestTimer};
use crate::state::AppState;

/// Body of `POST /analyze`
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub text: Option<String>,
}

/// Analyze a text and store the result
///
/// POST /analyze
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalysisRecord>, ApiError> {
    let timer = RequestTimer::new("analyze");

    let result = run(&state, payload).await;
    match &result {
        Ok(_) => timer.record(StatusCode::OK),
        Err(e) => timer.record(e.status()),
    }

    result.map(Json)
}

async fn run(
    state: &AppState,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<AnalysisRecord, ApiError> {
    let Json(request) = payload.map_err(rejection_to_error)?;
    let text = validate_text(request.text, state.config.max_text_chars)?;

    info!(chars = text.chars().count(), "Handling POST /analyze");

    let (analyzer, store, input) = (&state.analyzer, &state.store, text.as_str());
    let submitted_at = Instant::now();

    // The write runs inside the slot, so a storage failure releases it too
    let outcome = state
        .queue
        .submit(move || async move {
            metrics::record_queue_wait(submitted_at.elapsed());
            let record = analyzer.analyze(input).await?;
            store.insert(&record).await?;
            Ok::<_, ApiError>(record)
        })
        .await;

    match &outcome {
        Ok(record) => info!(
            id = %record.id,
            topics = ?record.metadata.topics,
            elapsed_ms = submitted_at.elapsed().as_millis() as u64,
            "Analysis stored"
        ),
        Err(ApiError::AtCapacity) => {
            metrics::record_rejected();
            let snapshot = state.queue.snapshot();
            warn!(
                in_flight = snapshot.in_flight,
                queued = snapshot.queued,
                "Rejected analysis, server at capacity"
            );
        }
        Err(_) => {}
    }

    outcome
}

fn rejection_to_error(rejection: JsonRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("request body exceeds the size limit".to_string())
    } else {
        ApiError::InvalidInput(rejection.body_text())
    }
}

/// `text` must be present, not blank, and at most `max_chars` characters
fn validate_text(text: Option<String>, max_chars: usize) -> Result<String, ApiError> {
    let text = text.ok_or_else(|| ApiError::InvalidInput("`text` is required".to_string()))?;

    if text.trim().is_empty() {
        return Err(ApiError::InvalidInput("`text` must not be empty".to_string()));
    }

    let chars = text.chars().count();
    if chars > max_chars {
        return Err(ApiError::PayloadTooLarge(format!(
            "`text` is {chars} characters, the limit is {max_chars}"
        )));
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_text() {
        assert_eq!(
            validate_text(Some("hello".into()), 10).unwrap(),
            "hello"
        );
        assert!(matches!(
            validate_text(None, 10),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_text(Some(" \n\t ".into()), 10),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_text(Some("x".repeat(11)), 10),
            Err(ApiError::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn test_limit_counts_characters_not_bytes() {
        // 10 characters, 20 bytes
        assert!(validate_text(Some("é".repeat(10)), 10).is_ok());
    }
}
