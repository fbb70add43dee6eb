//! Configuration for the admission queue.

use crate::error::ConfigError;

/// Limits enforced by the admission queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionConfig {
    /// Maximum number of work units executing at the same time
    max_concurrent: usize,

    /// Maximum number of submissions waiting for a slot.
    /// Zero disables queueing entirely.
    max_queue_size: usize,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            max_queue_size: 16,
        }
    }
}

impl AdmissionConfig {
    /// Create a validated configuration
    pub fn new(max_concurrent: usize, max_queue_size: usize) -> Result<Self, ConfigError> {
        if max_concurrent == 0 {
            return Err(ConfigError::ZeroConcurrency(max_concurrent));
        }
        Ok(Self {
            max_concurrent,
            max_queue_size,
        })
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn max_queue_size(&self) -> usize {
        self.max_queue_size
    }
}
