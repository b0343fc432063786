//! # LogWriter: pool events as `tracing` records
//!
//! A subscriber that turns every [`Event`] into one `tracing` record under the
//! `taskpool::events` target. Pair it with any `tracing` subscriber
//! (e.g. `tracing_subscriber::fmt`) for console output.
//!
//! ## Example output
//! ```text
//! INFO taskpool::events: task added task="Task_1" priority=0 pending=1 running=0
//! INFO taskpool::events: task started task="Task_1" wait_ms=0 running=1
//! INFO taskpool::events: task complete task="Task_1" outcome="completed" exec_ms=300
//! WARN taskpool::events: task complete task="Task_2" outcome="failed" exec_ms=5 err="boom"
//! INFO taskpool::events: all pending cancelled count=3 reason="shutdown"
//! INFO taskpool::events: pool destroyed submitted=10 completed=9 failed=1 cancelled=0
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind, TaskOutcome};
use crate::subscribers::Subscribe;

const TARGET: &str = "taskpool::events";

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn ms(d: Option<std::time::Duration>) -> u64 {
    d.map(|d| d.as_millis() as u64).unwrap_or_default()
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task_name().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::TaskAdded => {
                let priority = e.task.as_ref().map(|t| t.meta.priority).unwrap_or_default();
                info!(target: TARGET, task, priority, pending = e.pending, running = e.running, "task added");
            }
            EventKind::TaskStarted => {
                let wait_ms = ms(e.task.as_ref().map(|t| t.wait_time()));
                info!(target: TARGET, task, wait_ms, running = e.running, "task started");
            }
            EventKind::TaskComplete => {
                let exec_ms = ms(e.task.as_ref().and_then(|t| t.duration()));
                match e.outcome {
                    Some(TaskOutcome::Failed) => {
                        warn!(target: TARGET, task, outcome = "failed", exec_ms, err = reason, "task complete")
                    }
                    _ => info!(target: TARGET, task, outcome = "completed", exec_ms, "task complete"),
                }
            }
            EventKind::TaskCancelled => {
                info!(target: TARGET, task, reason, "task cancelled");
            }
            EventKind::AllPendingCancelled => {
                info!(target: TARGET, count = e.count, reason, "all pending cancelled");
            }
            EventKind::Idle => debug!(target: TARGET, "pool idle"),
            EventKind::Paused => info!(target: TARGET, "pool paused"),
            EventKind::Resumed => info!(target: TARGET, "pool resumed"),
            EventKind::AllTasksComplete => info!(target: TARGET, "all tasks complete"),
            EventKind::SchedulerError => {
                error!(target: TARGET, err = reason, "scheduling pass aborted");
            }
            EventKind::PoolDestroyed => match e.metrics {
                Some(m) => info!(
                    target: TARGET,
                    submitted = m.total_submitted,
                    completed = m.total_completed,
                    failed = m.total_failed,
                    cancelled = m.total_cancelled,
                    "pool destroyed"
                ),
                None => info!(target: TARGET, "pool destroyed"),
            },
            EventKind::SubscriberOverflow => {
                warn!(target: TARGET, subscriber = e.subscriber, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                error!(target: TARGET, subscriber = e.subscriber, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
