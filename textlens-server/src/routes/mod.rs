//! HTTP route handlers for textlens.
//!
//! - `analyze`: text analysis (the only caller of the admission queue)
//! - `search`: topic search over stored analyses
//! - `health`: health check and metrics endpoints

pub mod analyze;
pub mod health;
pub mod search;

// Re-export handlers for convenience
pub use analyze::analyze;
pub use health::{health, live, metrics, metrics_prometheus, ready};
pub use search::search;
