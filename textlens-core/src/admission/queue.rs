//! Bounded-concurrency admission queue.
//!
//! The `(in_flight, waiters)` pair lives behind a single mutex that is never
//! held across an `.await`. Waiting submissions park on a oneshot channel;
//! a finishing unit hands its slot straight to the oldest live waiter, so
//! `in_flight` does not dip between the two and no newcomer can jump the
//! queue.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::sync::oneshot;

use super::config::AdmissionConfig;
use super::metrics::AdmissionMetrics;
use crate::error::AdmissionError;

/// Mutable queue state, only touched under the lock
struct State {
    /// Work units currently holding a slot
    in_flight: usize,
    /// Parked submissions, oldest first
    waiters: VecDeque<oneshot::Sender<AdmissionSlot>>,
}

struct Shared {
    config: AdmissionConfig,
    state: Mutex<State>,
    metrics: Arc<AdmissionMetrics>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        // Nothing panics while holding the lock, but never let poisoning wedge the queue
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Give a finished unit's slot to the next live waiter, or free it.
    fn release(self: &Arc<Self>) {
        loop {
            let waiter = {
                let mut state = self.lock();
                match state.waiters.pop_front() {
                    Some(waiter) => waiter,
                    None => {
                        debug_assert!(state.in_flight > 0, "slot released twice");
                        state.in_flight = state.in_flight.saturating_sub(1);
                        tracing::debug!(in_flight = state.in_flight, "Slot released");
                        return;
                    }
                }
            };

            // Sent outside the lock: a slot bounced back from a dead receiver is disarmed
            // before it can re-enter `release`.
            match waiter.send(AdmissionSlot::new(Arc::clone(self))) {
                Ok(()) => {
                    tracing::debug!("Slot handed to next waiter");
                    return;
                }
                Err(slot) => {
                    slot.disarm();
                    self.metrics.record_abandoned();
                }
            }
        }
    }
}

/// One unit of execution capacity.
///
/// Held while work runs; dropping it (on success, error, cancellation or
/// panic) passes the slot to the oldest waiter or frees it.
pub struct AdmissionSlot {
    shared: Option<Arc<Shared>>,
}

impl AdmissionSlot {
    fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared: Some(shared),
        }
    }

    /// Forget the slot without releasing it; the caller already accounted for it.
    fn disarm(mut self) {
        self.shared = None;
    }
}

impl Drop for AdmissionSlot {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.release();
        }
    }
}

impl fmt::Debug for AdmissionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionSlot")
            .field("armed", &self.shared.is_some())
            .finish()
    }
}

enum TicketState {
    Ready(AdmissionSlot),
    Waiting {
        receiver: oneshot::Receiver<AdmissionSlot>,
        queued_at: Instant,
    },
}

/// Result of a successful admission decision.
///
/// Either already holds a slot or is parked in the wait queue. Dropping a
/// waiting ticket abandons its place in line.
pub struct Ticket {
    state: TicketState,
    metrics: Arc<AdmissionMetrics>,
}

impl Ticket {
    /// Whether this submission had to join the wait queue
    pub fn is_queued(&self) -> bool {
        matches!(self.state, TicketState::Waiting { .. })
    }

    /// Wait until the ticket holds a slot.
    ///
    /// This is the only suspension point of the queue.
    pub async fn ready(self) -> Result<AdmissionSlot, AdmissionError> {
        match self.state {
            TicketState::Ready(slot) => Ok(slot),
            TicketState::Waiting {
                receiver,
                queued_at,
            } => {
                let slot = receiver.await.map_err(|_| AdmissionError::Closed)?;
                let waited = queued_at.elapsed();
                self.metrics.record_wait(waited);
                tracing::debug!(wait_ms = waited.as_millis() as u64, "Waiter admitted");
                Ok(slot)
            }
        }
    }
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticket")
            .field("queued", &self.is_queued())
            .finish()
    }
}

/// Point-in-time view of the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionSnapshot {
    pub in_flight: usize,
    pub queued: usize,
    pub max_concurrent: usize,
    pub max_queue_size: usize,
}

/// Admission queue bounding concurrent work and pending submissions.
///
/// Cloning is cheap and yields a handle to the same queue. Separate
/// `AdmissionQueue::new` calls share nothing.
#[derive(Clone)]
pub struct AdmissionQueue {
    shared: Arc<Shared>,
}

impl AdmissionQueue {
    /// Create a queue with fresh metrics
    pub fn new(config: AdmissionConfig) -> Self {
        Self::with_metrics(config, Arc::new(AdmissionMetrics::new()))
    }

    /// Create a queue reporting into existing metrics
    pub fn with_metrics(config: AdmissionConfig, metrics: Arc<AdmissionMetrics>) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(State {
                    in_flight: 0,
                    waiters: VecDeque::with_capacity(config.max_queue_size()),
                }),
                metrics,
            }),
        }
    }

    /// Decide synchronously whether a submission runs now, waits, or is rejected.
    ///
    /// On rejection nothing has been reserved and no state has changed apart
    /// from the rejection counter.
    pub fn admit(&self) -> Result<Ticket, AdmissionError> {
        let shared = &self.shared;
        let config = shared.config;
        shared.metrics.record_submitted();

        let mut state = shared.lock();

        if state.in_flight < config.max_concurrent() {
            state.in_flight += 1;
            let in_flight = state.in_flight;
            drop(state);

            shared.metrics.record_admitted();
            tracing::debug!(in_flight, "Admitted immediately");
            return Ok(Ticket {
                state: TicketState::Ready(AdmissionSlot::new(Arc::clone(shared))),
                metrics: Arc::clone(&shared.metrics),
            });
        }

        // Callers that gave up waiting no longer count against the queue bound
        let before = state.waiters.len();
        state.waiters.retain(|waiter| !waiter.is_closed());
        let pruned = before - state.waiters.len();

        if state.waiters.len() < config.max_queue_size() {
            let (sender, receiver) = oneshot::channel();
            state.waiters.push_back(sender);
            let depth = state.waiters.len();
            drop(state);

            for _ in 0..pruned {
                shared.metrics.record_abandoned();
            }
            shared.metrics.record_queued(depth);
            tracing::debug!(queue_depth = depth, "Submission queued");
            return Ok(Ticket {
                state: TicketState::Waiting {
                    receiver,
                    queued_at: Instant::now(),
                },
                metrics: Arc::clone(&shared.metrics),
            });
        }
        drop(state);

        for _ in 0..pruned {
            shared.metrics.record_abandoned();
        }
        shared.metrics.record_rejected();
        tracing::debug!(
            max_concurrent = config.max_concurrent(),
            max_queue_size = config.max_queue_size(),
            "Submission rejected, queue at capacity"
        );
        Err(AdmissionError::CapacityExceeded {
            max_concurrent: config.max_concurrent(),
            max_queue_size: config.max_queue_size(),
        })
    }

    /// Run `work` under the admission policy.
    ///
    /// `work` is only invoked once a slot is held, and never for a rejected
    /// submission. Its `Ok` or `Err` is returned unchanged; the queue's own
    /// rejection is converted into `E`. The slot is released however `work`
    /// ends, including a panic or the returned future being dropped.
    pub async fn submit<F, Fut, T, E>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<AdmissionError>,
    {
        let ticket = self.admit()?;
        let slot = ticket.ready().await?;

        let result = work().await;
        self.shared.metrics.record_settled(result.is_ok());

        drop(slot);
        result
    }

    /// Number of work units currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.shared.lock().in_flight
    }

    /// Number of live submissions waiting for a slot
    pub fn queued(&self) -> usize {
        let state = self.shared.lock();
        state.waiters.iter().filter(|w| !w.is_closed()).count()
    }

    pub fn snapshot(&self) -> AdmissionSnapshot {
        let state = self.shared.lock();
        AdmissionSnapshot {
            in_flight: state.in_flight,
            queued: state.waiters.iter().filter(|w| !w.is_closed()).count(),
            max_concurrent: self.shared.config.max_concurrent(),
            max_queue_size: self.shared.config.max_queue_size(),
        }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.shared.config
    }

    pub fn metrics(&self) -> &Arc<AdmissionMetrics> {
        &self.shared.metrics
    }
}

impl fmt::Debug for AdmissionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionQueue")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
