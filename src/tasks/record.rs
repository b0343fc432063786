//! # Task record: one work item, its metadata, state and completion handle.
//!
//! [`TaskRecord`] is the sole translator between a work item's result and the
//! record's terminal state. [`TaskRecord::execute`] never propagates a work
//! failure: errors and panics become `Failed` and reject the handle.
//!
//! ## Execute flow
//! ```text
//! execute()
//!   ├─ start(): state != Pending ──► Err(PoolError::InvalidState)
//!   │           started_at = now, state = Running
//!   ├─ run(): work().catch_unwind().await
//!   │     ├─ Ok(Ok(v))   ──► ended_at, Completed, outcome = Ok(v)
//!   │     ├─ Ok(Err(e))  ──► ended_at, Failed,    outcome = Err(e)
//!   │     └─ Err(panic)  ──► ended_at, Failed,    outcome = Err(Panicked)
//!   ├─ release(): handle ◄─ outcome
//!   └─ Ok(())
//! ```
//!
//! The pool calls `run` and `release` separately: the finished record is
//! moved into history first, so a caller woken by the handle already sees
//! the terminal state through the pool.
//!
//! ## Rules
//! - The work item is owned by the record and consumed by the first `execute`.
//! - The completion handle is settled **after** the terminal state is written.
//! - `cancel` only affects `Pending` records.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::error::{PoolError, TaskError, panic_info};
use crate::tasks::{CompletionHandle, TaskId, TaskInfo, TaskMeta, TaskOptions, TaskState, info};

/// Type-erased work item: produces a fresh future when invoked once.
pub(crate) type WorkFn<T> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T, TaskError>> + Send>;

/// A submitted work item with identity, metadata, state and completion handle.
///
/// ## Example
/// ```rust
/// use taskpool::{TaskError, TaskOptions, TaskRecord, TaskState};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (mut record, handle) =
///     TaskRecord::new(|| async { Ok::<_, TaskError>(21 * 2) }, TaskOptions::new());
/// assert_eq!(record.state(), TaskState::Pending);
///
/// record.execute().await.unwrap();
/// assert_eq!(record.state(), TaskState::Completed);
/// assert_eq!(handle.await, Ok(42));
/// # }
/// ```
pub struct TaskRecord<T> {
    meta: TaskMeta,
    state: TaskState,
    started_at: Option<Instant>,
    ended_at: Option<Instant>,
    failure: Option<TaskError>,
    work: Option<WorkFn<T>>,
    outcome: Option<Result<T, TaskError>>,
    completion: Option<oneshot::Sender<Result<T, TaskError>>>,
}

impl<T: Send + 'static> TaskRecord<T> {
    /// Wraps `work` into a `Pending` record and returns it with its completion handle.
    pub fn new<F, Fut>(work: F, opts: TaskOptions) -> (Self, CompletionHandle<T>)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        let meta = TaskMeta::new(
            opts.name.as_deref(),
            opts.priority,
            opts.expected_duration,
        );
        let (tx, rx) = oneshot::channel();
        let handle = CompletionHandle::new(meta.id, rx);

        let work: WorkFn<T> = Box::new(move || work().boxed());
        let record = Self {
            meta,
            state: TaskState::Pending,
            started_at: None,
            ended_at: None,
            failure: None,
            work: Some(work),
            outcome: None,
            completion: Some(tx),
        };
        (record, handle)
    }

    /// Runs the work item to completion and settles the handle.
    ///
    /// Fails only with [`PoolError::InvalidState`] when the record is not `Pending`;
    /// the work item's own failure is recorded, never returned.
    pub async fn execute(&mut self) -> Result<(), PoolError> {
        let work = self.start()?;
        self.run(work).await;
        self.release();
        Ok(())
    }

    /// `Pending → Running`: stamps `started_at` and hands out the work item.
    ///
    /// The pool calls this at admission so snapshots taken right after already
    /// show the record as running.
    pub(crate) fn start(&mut self) -> Result<WorkFn<T>, PoolError> {
        let work = match self.state {
            TaskState::Pending => self.work.take(),
            _ => None,
        };
        let Some(work) = work else {
            return Err(PoolError::InvalidState {
                task: self.meta.id,
                state: self.state,
                op: "execute",
            });
        };
        self.started_at = Some(Instant::now());
        self.state = TaskState::Running;
        Ok(work)
    }

    /// Drives a started work item and writes the terminal state.
    ///
    /// The outcome is held until [`release`](Self::release).
    pub(crate) async fn run(&mut self, work: WorkFn<T>) {
        // `work()` runs inside the guarded future so a panic while building it is caught too.
        let guarded = AssertUnwindSafe(async move { work().await }).catch_unwind();
        let outcome = match guarded.await {
            Ok(res) => res,
            Err(payload) => Err(TaskError::Panicked {
                info: panic_info(&*payload),
            }),
        };

        self.ended_at = Some(Instant::now());
        match &outcome {
            Ok(_) => self.state = TaskState::Completed,
            Err(err) => {
                self.state = TaskState::Failed;
                self.failure = Some(err.clone());
            }
        }
        self.outcome = Some(outcome);
    }
}

impl<T> TaskRecord<T> {
    /// Cancels a `Pending` record: rejects the handle with `reason` and moves to `Cancelled`.
    ///
    /// Returns `false` (and does nothing) for any other state.
    pub fn cancel(&mut self, reason: impl Into<String>) -> bool {
        if self.state != TaskState::Pending {
            return false;
        }
        let err = TaskError::Canceled {
            reason: reason.into(),
        };
        self.work = None;
        self.state = TaskState::Cancelled;
        self.failure = Some(err.clone());
        self.settle(Err(err));
        true
    }

    /// Immutable scheduling metadata.
    #[inline]
    pub fn meta(&self) -> &TaskMeta {
        &self.meta
    }

    /// Task identifier.
    #[inline]
    pub fn id(&self) -> TaskId {
        self.meta.id
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Failure or cancellation reason, if the record ended that way.
    pub fn failure(&self) -> Option<&TaskError> {
        self.failure.as_ref()
    }

    /// `(started_at or now) - created_at`.
    pub fn wait_time(&self) -> Duration {
        info::wait_time(self.meta.created_at, self.started_at)
    }

    /// `ended_at - started_at`, or `None` while not finished.
    pub fn duration(&self) -> Option<Duration> {
        info::duration(self.started_at, self.ended_at)
    }

    /// Owned snapshot of the record.
    pub fn info(&self) -> TaskInfo {
        TaskInfo {
            meta: self.meta.clone(),
            state: self.state,
            started_at: self.started_at,
            ended_at: self.ended_at,
            failure: self.failure.clone(),
        }
    }

    /// Hands the outcome stored by `run` to the completion handle.
    pub(crate) fn release(&mut self) {
        if let Some(outcome) = self.outcome.take() {
            self.settle(outcome);
        }
    }

    /// Settles the completion handle; later calls are no-ops.
    fn settle(&mut self, outcome: Result<T, TaskError>) {
        if let Some(tx) = self.completion.take() {
            // The caller may have dropped its handle; the outcome is still recorded.
            let _ = tx.send(outcome);
        }
    }
}

impl<T> std::fmt::Debug for TaskRecord<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRecord")
            .field("meta", &self.meta)
            .field("state", &self.state)
            .field("started_at", &self.started_at)
            .field("ended_at", &self.ended_at)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}
