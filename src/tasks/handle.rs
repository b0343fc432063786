//! # Completion handle returned by `add_task`.
//!
//! A [`CompletionHandle`] is the receiving end of a single-settlement channel.
//! The owning [`TaskRecord`](crate::TaskRecord) settles it exactly once, after
//! its terminal state is written (and, inside a pool, recorded in history):
//!
//! - `Completed` → `Ok(value)`
//! - `Failed` → `Err(TaskError::Fail | TaskError::Panicked)`
//! - `Cancelled` → `Err(TaskError::Canceled { reason })`
//!
//! If the record is dropped without settling (the pool was dropped without
//! `destroy`), the handle resolves to `TaskError::Canceled` instead of hanging.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::TaskError;
use crate::tasks::TaskId;

/// Reason reported when a record disappears without settling its handle.
const DROPPED_REASON: &str = "task dropped before completion";

/// Awaitable outcome of one submitted work item.
#[must_use = "a completion handle does nothing unless awaited"]
#[derive(Debug)]
pub struct CompletionHandle<T> {
    id: TaskId,
    rx: oneshot::Receiver<Result<T, TaskError>>,
}

impl<T> CompletionHandle<T> {
    pub(crate) fn new(id: TaskId, rx: oneshot::Receiver<Result<T, TaskError>>) -> Self {
        Self { id, rx }
    }

    /// Identifier of the task this handle belongs to (use with `cancel_task`).
    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }
}

impl<T> Future for CompletionHandle<T> {
    type Output = Result<T, TaskError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_closed)) => Poll::Ready(Err(TaskError::Canceled {
                reason: DROPPED_REASON.to_string(),
            })),
            Poll::Pending => Poll::Pending,
        }
    }
}
