//! Prometheus metrics for textlens
//!
//! Exposes metrics in Prometheus format for monitoring and observability.

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use textlens_core::AdmissionSnapshot;

lazy_static! {
    /// Global Prometheus registry for textlens metrics
    pub static ref REGISTRY: Registry = Registry::new();

    // ============== HTTP Metrics ==============

    /// Total requests counter with endpoint and status labels
    pub static ref REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("requests_total", "Total number of HTTP requests")
            .namespace("textlens"),
        &["endpoint", "status"]
    ).expect("metric can be created");

    /// Request duration histogram with endpoint label
    pub static ref REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "request_duration_seconds",
            "Request duration in seconds"
        )
        .namespace("textlens")
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["endpoint"]
    ).expect("metric can be created");

    // ============== LLM Metrics ==============

    /// LLM calls by operation and outcome
    pub static ref LLM_CALLS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("llm_calls_total", "Total LLM calls")
            .namespace("textlens"),
        &["operation", "outcome"]
    ).expect("metric can be created");

    /// LLM call latency by operation
    pub static ref LLM_CALL_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "llm_call_duration_seconds",
            "LLM call duration in seconds"
        )
        .namespace("textlens")
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0]),
        &["operation"]
    ).expect("metric can be created");

    /// Summary calls avoided for short input
    pub static ref SUMMARY_SKIPPED_TOTAL: Counter = Counter::with_opts(
        Opts::new("summary_skipped_total", "Summaries skipped because the input was short")
            .namespace("textlens")
    ).expect("metric can be created");

    /// LLM backend health status (1 = healthy, 0 = unhealthy)
    pub static ref BACKEND_HEALTHY: Gauge = Gauge::with_opts(
        Opts::new("backend_healthy", "Backend health status (1=healthy, 0=unhealthy)")
            .namespace("textlens")
    ).expect("metric can be created");

    // ============== Admission Metrics ==============

    /// Analyses currently holding a slot
    pub static ref ACTIVE_REQUESTS: Gauge = Gauge::with_opts(
        Opts::new("active_requests", "Number of analyses currently executing")
            .namespace("textlens")
    ).expect("metric can be created");

    /// Analyses waiting for a slot
    pub static ref QUEUE_SIZE: Gauge = Gauge::with_opts(
        Opts::new("queue_size", "Current number of analyses waiting for a slot")
            .namespace("textlens")
    ).expect("metric can be created");

    /// Maximum concurrent analyses gauge
    pub static ref MAX_CONCURRENT_REQUESTS: Gauge = Gauge::with_opts(
        Opts::new("max_concurrent_requests", "Maximum concurrent analyses allowed")
            .namespace("textlens")
    ).expect("metric can be created");

    /// Maximum queue depth gauge
    pub static ref MAX_QUEUE_SIZE: Gauge = Gauge::with_opts(
        Opts::new("max_queue_size", "Maximum analyses allowed to wait")
            .namespace("textlens")
    ).expect("metric can be created");

    /// Time from submission to the start of work
    pub static ref QUEUE_WAIT_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "queue_wait_seconds",
            "Time spent waiting for an admission slot"
        )
        .namespace("textlens")
        .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0])
    ).expect("metric can be created");

    /// Requests rejected counter (capacity exceeded)
    pub static ref REQUESTS_REJECTED_TOTAL: Counter = Counter::with_opts(
        Opts::new("requests_rejected_total", "Total analyses rejected because the server was at capacity")
            .namespace("textlens")
    ).expect("metric can be created");
}

/// Register all metrics with the global registry.
/// Should be called once at startup.
pub fn register_metrics() -> prometheus::Result<()> {
    // HTTP metrics
    REGISTRY.register(Box::new(REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEST_DURATION_SECONDS.clone()))?;

    // LLM metrics
    REGISTRY.register(Box::new(LLM_CALLS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(LLM_CALL_DURATION_SECONDS.clone()))?;
    REGISTRY.register(Box::new(SUMMARY_SKIPPED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(BACKEND_HEALTHY.clone()))?;

    // Admission metrics
    REGISTRY.register(Box::new(ACTIVE_REQUESTS.clone()))?;
    REGISTRY.register(Box::new(QUEUE_SIZE.clone()))?;
    REGISTRY.register(Box::new(MAX_CONCURRENT_REQUESTS.clone()))?;
    REGISTRY.register(Box::new(MAX_QUEUE_SIZE.clone()))?;
    REGISTRY.register(Box::new(QUEUE_WAIT_SECONDS.clone()))?;
    REGISTRY.register(Box::new(REQUESTS_REJECTED_TOTAL.clone()))?;

    Ok(())
}

/// Encode all metrics to Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_else(|e| format!("# Error encoding metrics: {}", e))
}

/// Helper struct for tracking request duration.
/// A timer dropped without `record` is counted as cancelled
/// (the client went away before a response was produced).
pub struct RequestTimer {
    endpoint: &'static str,
    start: Instant,
}

impl RequestTimer {
    /// Start a new request timer for the given endpoint.
    pub fn new(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            start: Instant::now(),
        }
    }

    /// Record the response status of the request.
    pub fn record(self, status: StatusCode) {
        self.observe(status.as_str());
        // Prevent the Drop impl from running
        std::mem::forget(self);
    }

    fn observe(&self, status: &str) {
        REQUEST_DURATION_SECONDS
            .with_label_values(&[self.endpoint])
            .observe(self.start.elapsed().as_secs_f64());
        REQUESTS_TOTAL
            .with_label_values(&[self.endpoint, status])
            .inc();
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        self.observe("cancelled");
    }
}

/// Record one LLM call.
pub fn record_llm_call(operation: &str, outcome: &str, duration: Duration) {
    LLM_CALLS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
    LLM_CALL_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
}

/// Record a summary call skipped for short input.
pub fn record_summary_skipped() {
    SUMMARY_SKIPPED_TOTAL.inc();
}

/// Record the time a submission waited before its work started.
pub fn record_queue_wait(wait: Duration) {
    QUEUE_WAIT_SECONDS.observe(wait.as_secs_f64());
}

/// Record an analysis rejected at capacity.
pub fn record_rejected() {
    REQUESTS_REJECTED_TOTAL.inc();
}

/// Set backend health status.
pub fn set_backend_healthy(healthy: bool) {
    BACKEND_HEALTHY.set(if healthy { 1.0 } else { 0.0 });
}

/// Copy the live admission state into the gauges.
pub fn set_admission_state(snapshot: &AdmissionSnapshot) {
    ACTIVE_REQUESTS.set(snapshot.in_flight as f64);
    QUEUE_SIZE.set(snapshot.queued as f64);
    MAX_CONCURRENT_REQUESTS.set(snapshot.max_concurrent as f64);
    MAX_QUEUE_SIZE.set(snapshot.max_queue_size as f64);
}
