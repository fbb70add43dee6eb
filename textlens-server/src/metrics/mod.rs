//! Metrics module for textlens
//!
//! Provides Prometheus metrics for monitoring and observability.

pub mod prometheus;

// Re-export commonly used items
pub use self::prometheus::{
    encode_metrics, record_llm_call, record_queue_wait, record_rejected, record_summary_skipped,
    register_metrics, set_admission_state, set_backend_healthy, RequestTimer,
};
