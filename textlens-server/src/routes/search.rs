//! Topic search endpoint.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::debug;

use crate::analysis::AnalysisRecord;
use crate::error::ApiError;
use crate::metrics::RequestTimer;
use crate::state::AppState;

/// Longest accepted `topic`, in characters
pub const MAX_TOPIC_CHARS: usize = 200;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Query string of `GET /search`
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub topic: Option<String>,
    // Kept as text so a bad value becomes our own 400
    pub limit: Option<String>,
}

/// Search stored analyses by topic substring, newest first
///
/// GET /search?topic=<string>&limit=<n>
pub async fn search(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<AnalysisRecord>>, ApiError> {
    let timer = RequestTimer::new("search");

    let result = match params {
        Ok(Query(params)) => run(&state, params).await,
        Err(rejection) => Err(ApiError::InvalidInput(rejection.body_text())),
    };
    match &result {
        Ok(_) => timer.record(StatusCode::OK),
        Err(e) => timer.record(e.status()),
    }

    result.map(Json)
}

async fn run(state: &AppState, params: SearchParams) -> Result<Vec<AnalysisRecord>, ApiError> {
    let topic = validate_topic(params.topic)?;
    let limit = parse_limit(params.limit.as_deref())?;

    let records = state.store.search_by_topic(&topic, limit).await?;
    debug!(topic = %topic, limit, matches = records.len(), "Search complete");
    Ok(records)
}

fn validate_topic(topic: Option<String>) -> Result<String, ApiError> {
    let topic = topic
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::InvalidInput("`topic` is required".to_string()))?;

    if topic.chars().count() > MAX_TOPIC_CHARS {
        return Err(ApiError::PayloadTooLarge(format!(
            "`topic` must be at most {MAX_TOPIC_CHARS} characters"
        )));
    }
    Ok(topic)
}

fn parse_limit(raw: Option<&str>) -> Result<u32, ApiError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_LIMIT);
    };

    match raw.trim().parse::<u32>() {
        Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => Ok(limit),
        _ => Err(ApiError::InvalidInput(format!(
            "`limit` must be an integer between 1 and {MAX_LIMIT}"
        ))),
    }
}
