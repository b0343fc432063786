//! # Shared pool state.
//!
//! Everything the public API and the scheduler loop both touch lives in
//! [`Shared`]: one `std::sync::Mutex` around [`PoolState`] plus the signalling
//! primitives around it.
//!
//! ```text
//! ConcurrencyPool (sync API) ──lock──┐
//!                                    ├──► PoolState { phase, pending, running, history, metrics }
//! scheduler loop (passes) ────lock───┘         │
//!                                              └──► load_tx (watch<Load>) ──► wait_for_all_tasks / destroy
//! ```
//!
//! ## Rules
//! - Only the scheduler loop moves records out of `pending` into `running`
//!   and out of `running` into `history`.
//! - `load_tx` is refreshed under the lock after every change of the counts.
//! - The lock is never held across an `.await`.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::{Metrics, PoolConfig};
use crate::events::{Bus, Event};
use crate::policies::PolicyRef;
use crate::tasks::{TaskId, TaskInfo, TaskRecord};

/// Lifecycle phase of a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolPhase {
    /// Admitting work.
    Active,
    /// Accepting submissions, not admitting them.
    Paused,
    /// Torn down; submissions are rejected.
    Destroyed,
}

impl PoolPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolPhase::Active => "active",
            PoolPhase::Paused => "paused",
            PoolPhase::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for PoolPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owned snapshot returned by [`ConcurrencyPool::status`](crate::ConcurrencyPool::status).
#[derive(Clone, Debug)]
pub struct PoolStatus {
    /// Name of the active scheduling policy.
    pub policy_name: String,
    /// Configured concurrency limit.
    pub max_concurrency: usize,
    /// Records waiting for admission.
    pub pending_count: usize,
    /// Records currently executing.
    pub running_count: usize,
    /// Records that finished (completed or failed).
    pub completed_count: usize,
    /// Lifecycle phase.
    pub phase: PoolPhase,
    /// Metrics at the time of the snapshot.
    pub metrics: Metrics,
}

/// Pending/running counts published through the load watch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Load {
    pub pending: usize,
    pub running: usize,
}

impl Load {
    #[inline]
    pub fn is_drained(&self) -> bool {
        self.pending == 0 && self.running == 0
    }
}

/// Mutable bookkeeping guarded by [`Shared::lock`].
pub(crate) struct PoolState<T> {
    pub phase: PoolPhase,
    /// Pending records, in submission order.
    pub pending: Vec<TaskRecord<T>>,
    /// Snapshots of admitted records; the records themselves travel with their work.
    pub running: HashMap<TaskId, TaskInfo>,
    /// Completed and failed records, in completion order.
    pub history: Vec<TaskInfo>,
    pub metrics: Metrics,
}

impl<T> PoolState<T> {
    pub fn new(phase: PoolPhase) -> Self {
        Self {
            phase,
            pending: Vec::new(),
            running: HashMap::new(),
            history: Vec::new(),
            metrics: Metrics::default(),
        }
    }

    #[inline]
    pub fn load(&self) -> Load {
        Load {
            pending: self.pending.len(),
            running: self.running.len(),
        }
    }

    /// Cancels every pending record and returns how many there were.
    pub fn cancel_pending(&mut self, reason: &str) -> usize {
        let count = self
            .pending
            .drain(..)
            .map(|mut record| record.cancel(reason))
            .filter(|cancelled| *cancelled)
            .count();
        self.metrics.record_cancelled(count);
        count
    }

    /// Snapshot of `id`, wherever it currently lives.
    pub fn find(&self, id: TaskId) -> Option<TaskInfo> {
        if let Some(record) = self.pending.iter().find(|r| r.id() == id) {
            return Some(record.info());
        }
        if let Some(info) = self.running.get(&id) {
            return Some(info.clone());
        }
        self.history.iter().find(|i| i.id() == id).cloned()
    }
}

/// State and signals shared by the pool handle and its background tasks.
pub(crate) struct Shared<T> {
    pub cfg: PoolConfig,
    pub policy: PolicyRef,
    pub bus: Bus,
    /// Capacity-1 "scheduling requested" signal.
    pub schedule: Notify,
    /// Stops the scheduler loop and the subscriber listener.
    pub token: CancellationToken,
    /// Subscriber listener, awaited by `destroy` so subscribers see the final events.
    pub listener: Mutex<Option<JoinHandle<()>>>,
    state: Mutex<PoolState<T>>,
    load_tx: watch::Sender<Load>,
}

impl<T> Shared<T> {
    pub fn new(
        cfg: PoolConfig,
        policy: PolicyRef,
        bus: Bus,
        token: CancellationToken,
        listener: Option<JoinHandle<()>>,
    ) -> Self {
        let state = PoolState::new(cfg.initial_phase());
        let (load_tx, _) = watch::channel(Load::default());
        Self {
            cfg,
            policy,
            bus,
            schedule: Notify::new(),
            token,
            listener: Mutex::new(listener),
            state: Mutex::new(state),
            load_tx,
        }
    }

    /// Locks the pool state.
    ///
    /// A poisoned lock is recovered: every mutation leaves the state consistent
    /// between statements, so a panic elsewhere never tears a record in half.
    pub fn lock(&self) -> MutexGuard<'_, PoolState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refreshes the load watch from `st`. Call with the lock held.
    pub fn publish_load(&self, st: &PoolState<T>) {
        self.load_tx.send_if_modified(|load| {
            let next = st.load();
            let changed = *load != next;
            *load = next;
            changed
        });
    }

    pub fn watch_load(&self) -> watch::Receiver<Load> {
        self.load_tx.subscribe()
    }

    #[inline]
    pub fn publish(&self, ev: Event) {
        self.bus.publish(ev);
    }

    /// Raises the scheduling signal; repeated raises before the next pass collapse into one.
    #[inline]
    pub fn request_schedule(&self) {
        self.schedule.notify_one();
    }
}
