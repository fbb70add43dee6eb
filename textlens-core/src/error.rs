//! Error types for the textlens core library
//!
//! # Error Hierarchy
//!
//! ```text
//! AdmissionError - raised by the admission queue itself
//! ConfigError    - invalid admission limits
//! ```
//!
//! Errors produced by submitted work never pass through these types: the
//! queue hands them back to the caller untouched. Callers convert
//! [`AdmissionError`] into their own error type through `From`.

use thiserror::Error;

/// Errors the admission queue can produce on its own
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// Every execution slot is busy and the wait queue is full
    #[error("Capacity exceeded ({max_concurrent} running, {max_queue_size} queued)")]
    CapacityExceeded {
        max_concurrent: usize,
        max_queue_size: usize,
    },

    /// The queue went away while the submission was waiting for a slot
    #[error("Admission queue closed")]
    Closed,
}

impl AdmissionError {
    /// Whether this is the "server at capacity" outcome
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, AdmissionError::CapacityExceeded { .. })
    }
}

/// Errors raised while validating admission limits
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_concurrent` must allow at least one running unit
    #[error("max_concurrent must be at least 1 (got {0})")]
    ZeroConcurrency(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_error_display() {
        let err = AdmissionError::CapacityExceeded {
            max_concurrent: 2,
            max_queue_size: 1,
        };
        assert_eq!(err.to_string(), "Capacity exceeded (2 running, 1 queued)");
        assert!(err.is_capacity_exceeded());
        assert!(!AdmissionError::Closed.is_capacity_exceeded());
    }
}
