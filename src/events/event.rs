//! # Events emitted by the pool.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Task events**: a record was added, admitted, finished or cancelled
//! - **Pool events**: lifecycle and drain notifications (paused, idle, destroyed, ...)
//! - **Subscriber events**: delivery problems inside the fan-out
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the task
//! snapshot, the outcome, reasons, counts and metrics.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use taskpool::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::AllPendingCancelled)
//!     .with_reason("shutting down")
//!     .with_count(3);
//!
//! assert_eq!(ev.kind, EventKind::AllPendingCancelled);
//! assert_eq!(ev.count, Some(3));
//! assert_eq!(ev.reason.as_deref(), Some("shutting down"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::core::{Metrics, PoolPhase};
use crate::tasks::TaskInfo;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of pool events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Task events ===
    /// A record entered the pending set.
    ///
    /// Sets:
    /// - `task`: snapshot (state `Pending`)
    /// - `pending`, `running`: load after the insert
    TaskAdded,

    /// A record was admitted and its work item spawned.
    ///
    /// Sets:
    /// - `task`: snapshot
    /// - `pending`, `running`: load after the admission
    TaskStarted,

    /// A running record reached `Completed` or `Failed`.
    ///
    /// Sets:
    /// - `task`: final snapshot (timings, failure)
    /// - `outcome`: completed or failed
    /// - `reason`: failure message (failed only)
    /// - `pending`, `running`: load after removal from the running set
    TaskComplete,

    /// A pending record was cancelled via `cancel_task`.
    ///
    /// Sets:
    /// - `task`: final snapshot (state `Cancelled`)
    /// - `reason`: cancellation reason
    TaskCancelled,

    // === Pool events ===
    /// `cancel_all_pending` ran.
    ///
    /// Sets:
    /// - `count`: number of records cancelled
    /// - `reason`: cancellation reason
    AllPendingCancelled,

    /// A scheduling pass ended with nothing pending and nothing running.
    Idle,

    /// Admissions stopped (`pause`).
    Paused,

    /// Admissions resumed (`resume`).
    Resumed,

    /// `wait_for_all_tasks` observed a drained pool.
    AllTasksComplete,

    /// A scheduling pass was aborted (e.g. the policy panicked).
    ///
    /// Sets:
    /// - `reason`: error description
    SchedulerError,

    /// `destroy` finished draining.
    ///
    /// Sets:
    /// - `metrics`: final metrics
    PoolDestroyed,

    // === Subscriber events ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: `"full"` or `"closed"`
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: panic info
    SubscriberPanicked,
}

/// Terminal outcome of an executed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskOutcome {
    /// Work item returned `Ok`.
    Completed,
    /// Work item returned `Err` or panicked.
    Failed,
}

impl TaskOutcome {
    /// Returns a short stable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskOutcome::Completed => "completed",
            TaskOutcome::Failed => "failed",
        }
    }
}

/// Pool event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Task snapshot, for task events.
    pub task: Option<TaskInfo>,
    /// Outcome, for `TaskComplete`.
    pub outcome: Option<TaskOutcome>,
    /// Human-readable reason (failures, cancellations, scheduler errors).
    pub reason: Option<Arc<str>>,
    /// Record count (`AllPendingCancelled`).
    pub count: Option<usize>,
    /// Pending records after the change that produced the event.
    pub pending: Option<usize>,
    /// Running records after the change that produced the event.
    pub running: Option<usize>,
    /// Lifecycle phase after the change (`Paused`, `Resumed`, `PoolDestroyed`).
    pub phase: Option<PoolPhase>,
    /// Metrics snapshot (`PoolDestroyed`).
    pub metrics: Option<Metrics>,
    /// Subscriber name (subscriber events).
    pub subscriber: Option<&'static str>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            outcome: None,
            reason: None,
            count: None,
            pending: None,
            running: None,
            phase: None,
            metrics: None,
            subscriber: None,
        }
    }

    /// Attaches a task snapshot.
    #[inline]
    pub fn with_task(mut self, task: TaskInfo) -> Self {
        self.task = Some(task);
        self
    }

    /// Attaches an outcome.
    #[inline]
    pub fn with_outcome(mut self, outcome: TaskOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a record count.
    #[inline]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Attaches the pool load (pending, running).
    #[inline]
    pub fn with_load(mut self, pending: usize, running: usize) -> Self {
        self.pending = Some(pending);
        self.running = Some(running);
        self
    }

    /// Attaches a lifecycle phase.
    #[inline]
    pub fn with_phase(mut self, phase: PoolPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Attaches a metrics snapshot.
    #[inline]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::SubscriberOverflow).with_reason(reason);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = Event::new(EventKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Name of the task this event is about, if any.
    #[inline]
    pub fn task_name(&self) -> Option<&str> {
        self.task.as_ref().map(|t| &*t.meta.name)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::Idle);
        let b = Event::new(EventKind::Idle);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn subscriber_events_carry_name() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.subscriber, Some("audit"));
        assert_eq!(ev.reason.as_deref(), Some("full"));
        assert!(ev.task_name().is_none());
    }
}
