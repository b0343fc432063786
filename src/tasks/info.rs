//! # Task identity, state and read-only snapshots.
//!
//! - [`TaskId`] process-unique, monotonically assigned identifier
//! - [`TaskState`] the record state machine
//! - [`TaskMeta`] immutable scheduling metadata (what policies rank on)
//! - [`TaskInfo`] owned snapshot of a record for status, history and events
//!
//! ## State machine
//! ```text
//! Pending ──execute──► Running ──ok──► Completed
//!    │                    └─────err──► Failed
//!    └──cancel──► Cancelled
//! ```
//! No transition is reversible; terminal states are `Completed`, `Failed`, `Cancelled`.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::TaskError;

/// Global counter for task identifiers.
static TASK_SEQ: AtomicU64 = AtomicU64::new(1);

/// Process-unique task identifier. Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn next() -> Self {
        Self(TASK_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Returns the raw numeric value.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Lifecycle state of a task record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Waiting in the pending set.
    Pending,
    /// Admitted; the work item is executing.
    Running,
    /// Work item returned `Ok`.
    Completed,
    /// Work item returned `Err` or panicked.
    Failed,
    /// Removed from the pending set before admission.
    Cancelled,
}

impl TaskState {
    /// Returns `true` for `Completed`, `Failed` and `Cancelled`.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Cancelled
        )
    }

    /// Returns a short stable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable scheduling metadata of a task.
///
/// Fixed at creation. Scheduling policies rank pending records by these fields only.
#[derive(Clone, Debug)]
pub struct TaskMeta {
    /// Identifier (also the final tie-break: lower id was submitted first).
    pub id: TaskId,
    /// Diagnostic label.
    pub name: Arc<str>,
    /// Caller-supplied urgency (higher is more urgent).
    pub priority: i32,
    /// Caller-supplied cost estimate.
    pub expected_duration: Duration,
    /// Submission instant.
    pub created_at: Instant,
}

impl TaskMeta {
    /// Creates metadata with a fresh id, stamped `created_at = now`.
    ///
    /// Without a name the record is labelled `Task_<id>`.
    pub fn new(name: Option<&str>, priority: i32, expected_duration: Duration) -> Self {
        let id = TaskId::next();
        let name: Arc<str> = match name {
            Some(n) => n.into(),
            None => format!("Task_{}", id.as_u64()).into(),
        };
        Self {
            id,
            name,
            priority,
            expected_duration,
            created_at: Instant::now(),
        }
    }
}

/// Owned snapshot of a task record.
///
/// Returned by status/history queries and carried by events. The success
/// value of a task is never part of the snapshot; it belongs to the
/// completion handle.
#[derive(Clone, Debug)]
pub struct TaskInfo {
    /// Immutable metadata.
    pub meta: TaskMeta,
    /// State at the time of the snapshot.
    pub state: TaskState,
    /// When the record was admitted, if it was.
    pub started_at: Option<Instant>,
    /// When the record reached `Completed`/`Failed`, if it did.
    pub ended_at: Option<Instant>,
    /// Failure or cancellation reason for `Failed`/`Cancelled` records.
    pub failure: Option<TaskError>,
}

impl TaskInfo {
    /// Shorthand for `self.meta.id`.
    #[inline]
    pub fn id(&self) -> TaskId {
        self.meta.id
    }

    /// Time spent pending: until admission, or until now if not yet admitted.
    pub fn wait_time(&self) -> Duration {
        wait_time(self.meta.created_at, self.started_at)
    }

    /// Execution time, or `None` if the record has not finished running.
    pub fn duration(&self) -> Option<Duration> {
        duration(self.started_at, self.ended_at)
    }
}

pub(crate) fn wait_time(created_at: Instant, started_at: Option<Instant>) -> Duration {
    started_at
        .unwrap_or_else(Instant::now)
        .saturating_duration_since(created_at)
}

pub(crate) fn duration(started_at: Option<Instant>, ended_at: Option<Instant>) -> Option<Duration> {
    match (started_at, ended_at) {
        (Some(start), Some(end)) => Some(end.saturating_duration_since(start)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = TaskMeta::new(None, 0, Duration::ZERO);
        let b = TaskMeta::new(None, 0, Duration::ZERO);
        assert!(b.id > a.id);
        assert_eq!(&*a.name, format!("Task_{}", a.id.as_u64()));
    }

    #[test]
    fn terminal_states() {
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::Running.is_terminal());
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(TaskState::Cancelled.is_terminal());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_time_runs_until_admission() {
        let meta = TaskMeta::new(Some("w"), 0, Duration::ZERO);
        tokio::time::advance(Duration::from_millis(40)).await;
        assert_eq!(wait_time(meta.created_at, None), Duration::from_millis(40));

        let started = meta.created_at + Duration::from_millis(10);
        assert_eq!(wait_time(meta.created_at, Some(started)), Duration::from_millis(10));
        assert_eq!(duration(Some(started), None), None);
        assert_eq!(
            duration(Some(started), Some(started + Duration::from_millis(5))),
            Some(Duration::from_millis(5))
        );
    }
}
