//! Error types used by the pool runtime and by work items.
//!
//! This module defines two main error enums:
//!
//! - [`PoolError`]: errors raised by the pool itself (bad arguments, bad state,
//!   admission after teardown, unknown policy names, drain timeouts).
//! - [`TaskError`]: the outcome of a single work item that did not complete.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::any::Any;
use std::fmt::Display;
use std::time::Duration;

use thiserror::Error;

use crate::tasks::{TaskId, TaskState};

/// # Errors produced by the pool.
///
/// Structural errors are returned synchronously to the caller of the offending
/// operation; they never travel through a completion handle.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Operation is not valid for the current state of a task record.
    #[error("task {task} cannot {op} while {state}")]
    InvalidState {
        /// Task the operation was attempted on.
        task: TaskId,
        /// State the task was in.
        state: TaskState,
        /// Operation name (e.g. `"execute"`).
        op: &'static str,
    },

    /// Malformed call or configuration.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong.
        reason: String,
    },

    /// Admission attempted after [`destroy`](crate::ConcurrencyPool::destroy).
    #[error("pool has been destroyed")]
    Destroyed,

    /// Policy name not present in the policy table.
    #[error("unknown policy {name:?}; available: {available:?}")]
    UnknownPolicy {
        /// Name that was requested.
        name: String,
        /// Registered names.
        available: Vec<&'static str>,
    },

    /// [`wait_for_all_tasks`](crate::ConcurrencyPool::wait_for_all_tasks) gave up.
    #[error("timed out after {timeout:?} waiting for tasks (pending={pending}, running={running})")]
    Timeout {
        /// The timeout that elapsed.
        timeout: Duration,
        /// Pending records at the moment of giving up.
        pending: usize,
        /// Running records at the moment of giving up.
        running: usize,
    },
}

impl PoolError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskpool::PoolError;
    ///
    /// assert_eq!(PoolError::Destroyed.as_label(), "pool_destroyed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PoolError::InvalidState { .. } => "pool_invalid_state",
            PoolError::InvalidArgument { .. } => "pool_invalid_argument",
            PoolError::Destroyed => "pool_destroyed",
            PoolError::UnknownPolicy { .. } => "pool_unknown_policy",
            PoolError::Timeout { .. } => "pool_timeout",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            PoolError::InvalidState { task, state, op } => {
                format!("cannot {op} {task}: state={state}")
            }
            PoolError::InvalidArgument { reason } => format!("invalid argument: {reason}"),
            PoolError::Destroyed => "pool destroyed".to_string(),
            PoolError::UnknownPolicy { name, available } => {
                format!("unknown policy {name}; available={}", available.join(","))
            }
            PoolError::Timeout {
                timeout,
                pending,
                running,
            } => format!("timeout: {timeout:?} pending={pending} running={running}"),
        }
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        PoolError::InvalidArgument {
            reason: reason.into(),
        }
    }
}

/// # Errors produced by work items.
///
/// A work item's failure is local to its record: it rejects that record's
/// completion handle and is counted in metrics, nothing else.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The work item returned an error.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The record was cancelled before it was admitted.
    #[error("cancelled: {reason}")]
    Canceled {
        /// Reason supplied by the canceller.
        reason: String,
    },

    /// The work item panicked while running.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload, if it was a string.
        info: String,
    },
}

impl TaskError {
    /// Wraps any displayable error as [`TaskError::Fail`].
    ///
    /// # Example
    /// ```
    /// use taskpool::TaskError;
    ///
    /// let err = TaskError::fail("connection refused");
    /// assert_eq!(err.to_string(), "execution failed: connection refused");
    /// ```
    pub fn fail(error: impl Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled { .. } => "task_canceled",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Canceled { reason } => format!("cancelled: {reason}"),
            TaskError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// Returns `true` if the record never ran because it was cancelled.
    pub fn is_canceled(&self) -> bool {
        matches!(self, TaskError::Canceled { .. })
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_info(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        let err = PoolError::Timeout {
            timeout: Duration::from_millis(50),
            pending: 0,
            running: 1,
        };
        assert_eq!(err.as_label(), "pool_timeout");
        assert_eq!(
            TaskError::Canceled {
                reason: "x".into()
            }
            .as_label(),
            "task_canceled"
        );
    }

    #[test]
    fn unknown_policy_lists_available_names() {
        let err = PoolError::UnknownPolicy {
            name: "round-robin".into(),
            available: vec!["FIFO", "LPT"],
        };
        assert_eq!(err.as_message(), "unknown policy round-robin; available=FIFO,LPT");
    }

    #[test]
    fn only_cancellation_is_canceled() {
        assert!(TaskError::Canceled { reason: "stop".into() }.is_canceled());
        assert!(!TaskError::fail("boom").is_canceled());
        assert!(!TaskError::Panicked { info: "oops".into() }.is_canceled());
    }
}
