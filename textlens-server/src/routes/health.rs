//! Health check and metrics endpoints.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::metrics;
use crate::state::AppState;

/// Health check endpoint
///
/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (database, llm) = tokio::join!(state.store.ping(), state.provider.health_check());
    metrics::set_backend_healthy(llm.is_ok());

    let healthy = database.is_ok() && llm.is_ok();
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if healthy { "healthy" } else { "unhealthy" },
            "database": match &database {
                Ok(_) => json!({ "status": "connected" }),
                Err(e) => json!({ "status": "disconnected", "error": e.to_string() }),
            },
            "llm": match &llm {
                Ok(_) => json!({ "provider": state.provider.name(), "status": "connected" }),
                Err(e) => json!({
                    "provider": state.provider.name(),
                    "status": "disconnected",
                    "error": e.to_string()
                }),
            },
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Admission state and counters
///
/// GET /metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let current = state.queue.snapshot();
    let totals = state.queue.metrics().snapshot();

    Json(json!({
        "admission": {
            "config": {
                "max_concurrent": current.max_concurrent,
                "max_queue_size": current.max_queue_size
            },
            "current": {
                "in_flight": current.in_flight,
                "queued": current.queued
            },
            "totals": {
                "submitted": totals.submitted,
                "admitted_immediately": totals.admitted_immediately,
                "queued": totals.queued,
                "rejected": totals.rejected,
                "completed": totals.completed,
                "failed": totals.failed,
                "abandoned": totals.abandoned,
                "waited": totals.waited,
                "max_queue_depth": totals.max_queue_depth
            },
            "performance": {
                "avg_queue_wait_ms": totals.avg_queue_wait_ms
            }
        },
        "analysis": {
            "min_summary_words": state.config.analysis.min_summary_words,
            "max_keywords": state.config.analysis.max_keywords,
            "max_text_chars": state.config.max_text_chars
        }
    }))
}

/// Prometheus scrape endpoint
///
/// GET /metrics/prometheus
pub async fn metrics_prometheus(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    metrics::set_admission_state(&state.queue.snapshot());

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::encode_metrics(),
    )
}

/// Ready check (for Kubernetes)
///
/// GET /ready
pub async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (database, llm) = tokio::join!(state.store.ping(), state.provider.health_check());
    if database.is_ok() && llm.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Live check (for Kubernetes)
///
/// GET /live
pub async fn live() -> impl IntoResponse {
    StatusCode::OK
}
