// textlens core library
//
// Domain-agnostic concurrency control for the textlens analysis service.

pub mod admission;
pub mod error;

pub use admission::{
    AdmissionConfig, AdmissionMetrics, AdmissionQueue, AdmissionSlot, AdmissionSnapshot,
    MetricsSnapshot, Ticket,
};
pub use error::{AdmissionError, ConfigError};
