//! textlens server library
//!
//! HTTP service that summarizes and classifies text through an LLM backend,
//! adds locally extracted keywords, stores the result and serves topic search.
//!
//! Every analysis runs inside a slot of a bounded
//! [`textlens_core::AdmissionQueue`]: excess requests wait in FIFO order up to
//! a limit and are rejected with 503 beyond it.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub mod analysis;
pub mod config;
pub mod error;
pub mod llm;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod store;
pub mod types;

pub use config::AppConfig;
pub use state::AppState;

use llm::{LlmProvider, OllamaProvider};
use store::AnalysisStore;

/// Slack allowed on top of the text limit for JSON framing
const BODY_OVERHEAD_BYTES: usize = 1024;

/// Worst-case JSON encoding of one character: a `\uXXXX\uXXXX` surrogate pair
const MAX_ESCAPED_CHAR_BYTES: usize = 12;

/// Transport limit for request bodies.
///
/// Large enough for any text of `max_text_chars` characters however it is
/// escaped; `validate_text` enforces the character count itself.
pub fn body_limit_for(max_text_chars: usize) -> usize {
    max_text_chars
        .saturating_mul(MAX_ESCAPED_CHAR_BYTES)
        .saturating_add(BODY_OVERHEAD_BYTES)
}

/// Initialize Prometheus metrics registry.
/// Should be called once before starting the server.
pub fn init_metrics() {
    if let Err(e) = metrics::register_metrics() {
        warn!("Failed to register Prometheus metrics: {}", e);
    }
}

/// Build the application router around shared state
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = body_limit_for(state.config.max_text_chars);

    Router::new()
        // Analysis endpoints
        .route("/analyze", post(routes::analyze))
        .route("/search", get(routes::search))
        // Health endpoints
        .route("/health", get(routes::health))
        .route("/ready", get(routes::ready))
        .route("/live", get(routes::live))
        .route("/metrics", get(routes::metrics))
        .route("/metrics/prometheus", get(routes::metrics_prometheus))
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the textlens server.
///
/// Opens the store, connects the LLM provider and serves until Ctrl-C.
/// In-flight analyses are allowed to finish before returning.
///
/// # Example
/// ```no_run
/// use textlens_server::{run_server, AppConfig};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = AppConfig::from_env()?;
///     run_server(config, true).await
/// }
/// ```
pub async fn run_server(config: AppConfig, show_banner: bool) -> anyhow::Result<()> {
    init_metrics();

    info!(
        port = config.port,
        ollama_url = %config.llm.base_url,
        model = %config.llm.model,
        "Starting textlens v{}",
        env!("CARGO_PKG_VERSION")
    );

    let store = AnalysisStore::connect(&config.database_url).await?;
    let provider: Arc<dyn LlmProvider> = Arc::new(OllamaProvider::new(&config.llm)?);

    // Check LLM connectivity
    match provider.health_check().await {
        Ok(_) => {
            metrics::set_backend_healthy(true);
            info!("Connected to LLM backend at {}", config.llm.base_url);
        }
        Err(e) => {
            metrics::set_backend_healthy(false);
            warn!(
                "Could not reach LLM backend at {}: {}. \
                 Server will start anyway; analyses fail until it is reachable.",
                config.llm.base_url, e
            );
        }
    }

    let state = Arc::new(AppState::new(config.clone(), provider, store));
    metrics::set_admission_state(&state.queue.snapshot());
    let app = build_router(state.clone());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("textlens listening on http://{}", addr);

    if show_banner {
        print_banner(&config);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining in-flight requests");
}

/// Print the startup banner
fn print_banner(config: &AppConfig) {
    let addr = format!("0.0.0.0:{}", config.port);

    println!();
    println!("==================================================");
    println!("  textlens v{}", env!("CARGO_PKG_VERSION"));
    println!("==================================================");
    println!("  Listening on: http://{}", addr);
    println!("  LLM backend:  {} ({})", config.llm.base_url, config.llm.model);
    println!("  LLM timeout:  {}s", config.llm.timeout.as_secs());
    println!("  Database:     {}", config.database_url);
    println!();
    println!("  Admission:");
    println!("    Max concurrent: {}", config.admission.max_concurrent());
    println!(
        "    Max queue: {}{}",
        config.admission.max_queue_size(),
        if config.admission.max_queue_size() == 0 {
            " (queueing disabled)"
        } else {
            ""
        }
    );
    println!();
    println!("  Endpoints:");
    println!("    Analyze: POST /analyze");
    println!("    Search:  GET  /search?topic=<topic>&limit=<n>");
    println!("    Health:  GET  /health, /ready, /live, /metrics");
    println!("    Prometheus: GET /metrics/prometheus");
    println!("==================================================");
    println!();
}
