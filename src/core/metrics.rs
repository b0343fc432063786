//! # Pool metrics.
//!
//! [`Metrics`] is a plain `Copy` snapshot: counters are always maintained,
//! timing aggregates only when `PoolConfig::enable_metrics` is set. Means are
//! running means over finished (completed + failed) records.

use std::time::Duration;

use crate::tasks::{TaskInfo, TaskState};

/// Counters and timing aggregates of a pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Metrics {
    /// Records accepted by `add_task`.
    pub total_submitted: u64,
    /// Records that reached `Completed`.
    pub total_completed: u64,
    /// Records that reached `Failed`.
    pub total_failed: u64,
    /// Records cancelled while pending.
    pub total_cancelled: u64,

    /// Mean time spent pending before admission.
    pub avg_wait: Duration,
    /// Longest time spent pending before admission.
    pub max_wait: Duration,
    /// Mean execution time.
    pub avg_exec: Duration,
    /// Longest execution time.
    pub max_exec: Duration,
}

impl Metrics {
    /// Records that finished executing (completed + failed).
    #[inline]
    pub fn total_finished(&self) -> u64 {
        self.total_completed + self.total_failed
    }

    pub(crate) fn record_submitted(&mut self) {
        self.total_submitted += 1;
    }

    pub(crate) fn record_cancelled(&mut self, n: usize) {
        self.total_cancelled += n as u64;
    }

    /// Accounts a finished record; `timing` gates the mean/max updates.
    pub(crate) fn record_finished(&mut self, info: &TaskInfo, timing: bool) {
        match info.state {
            TaskState::Completed => self.total_completed += 1,
            TaskState::Failed => self.total_failed += 1,
            _ => return,
        }
        if !timing {
            return;
        }
        let n = self.total_finished();
        let wait = info.wait_time();
        let exec = info.duration().unwrap_or_default();

        self.avg_wait = running_mean(self.avg_wait, wait, n);
        self.avg_exec = running_mean(self.avg_exec, exec, n);
        self.max_wait = self.max_wait.max(wait);
        self.max_exec = self.max_exec.max(exec);
    }
}

/// `mean + (sample - mean) / n`, in whole nanoseconds.
fn running_mean(mean: Duration, sample: Duration, n: u64) -> Duration {
    let mean_ns = mean.as_nanos() as i128;
    let delta = sample.as_nanos() as i128 - mean_ns;
    let next = mean_ns + delta / i128::from(n.max(1));
    Duration::from_nanos(next.clamp(0, i128::from(u64::MAX)) as u64)
}
