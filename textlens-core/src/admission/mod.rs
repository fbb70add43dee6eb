//! Admission control for asynchronous work.
//!
//! The admission queue bounds how many work units run at once and how many
//! may wait for a slot. Anything beyond both limits is turned away at the
//! door, before the work is ever started.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    submit(work)                          │
//! └───────────────────────────┬─────────────────────────────┘
//!                             │
//!                    ┌────────▼────────┐
//!                    │     admit()     │ ← synchronous decision
//!                    └──┬─────┬─────┬──┘
//!            slot free  │     │     │  both limits reached
//!                ┌──────▼┐ ┌──▼───┐ ┌▼───────────────────┐
//!                │ Ready │ │ FIFO │ │ CapacityExceeded   │
//!                └──┬────┘ │ wait │ └────────────────────┘
//!                   │      └──┬───┘
//!                   │         │ slot handed over on release
//!                ┌──▼─────────▼──┐
//!                │ AdmissionSlot │ ← held while work runs
//!                └───────┬───────┘
//!                        │ drop (success, error or panic)
//!                        ▼
//!              next live waiter, or in_flight - 1
//! ```
//!
//! # Guarantees
//!
//! - `0 <= in_flight <= max_concurrent` at all times
//! - A submission is rejected only when `in_flight == max_concurrent` and
//!   the wait queue holds `max_queue_size` live waiters
//! - Waiters are released strictly in FIFO order
//! - A slot is released exactly once whatever the outcome of the work
//! - Results and errors of the work are returned unchanged
//!
//! The queue never times work out. Work that never settles keeps its slot
//! forever; callers must bound their own work (the LLM provider does).

mod config;
mod metrics;
mod queue;

pub use config::AdmissionConfig;
pub use metrics::{AdmissionMetrics, MetricsSnapshot};
pub use queue::{AdmissionQueue, AdmissionSlot, AdmissionSnapshot, Ticket};
