//! # Task records and their companions.
//!
//! This module provides the task-related types:
//! - [`TaskRecord`] - one work item with identity, metadata, state and completion handle
//! - [`CompletionHandle`] - single-settlement future returned to the submitter
//! - [`TaskOptions`] - caller-supplied metadata (priority, expected duration, name)
//! - [`TaskId`], [`TaskState`], [`TaskMeta`], [`TaskInfo`] - identity, state and snapshots

mod handle;
mod info;
mod options;
mod record;

pub use handle::CompletionHandle;
pub use info::{TaskId, TaskInfo, TaskMeta, TaskState};
pub use options::TaskOptions;
pub use record::TaskRecord;
