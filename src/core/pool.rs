//! # ConcurrencyPool: bounded-concurrency scheduling of submitted work.
//!
//! The [`ConcurrencyPool`] accepts work items at any time, keeps at most
//! `max_concurrency` of them running, and picks the next one to admit with a
//! [`SchedulingPolicy`](crate::SchedulingPolicy).
//!
//! ## Architecture
//! ```text
//! add_task(work, opts)
//!     └─► pending.push(record) ─► TaskAdded ─► schedule.notify_one()
//!                                                   │
//!                                  scheduler loop ◄─┘
//!                                     └─► pass(): policy picks ─► running ─► TaskStarted
//!                                                                   │
//!                                               tokio::spawn(record.run(work))
//!                                                                   │
//!                                     ◄──── done_tx.send(record) ───┘
//!                                     └─► history, metrics ─► TaskComplete ─► pass()
//!
//! Event flow:
//!   pool API / scheduler loop ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                    └──► subscribe() receivers
//! ```
//!
//! ## Lifecycle
//! - `pause()` stops admissions; submissions are still accepted.
//! - `resume()` restarts admissions.
//! - `cancel_task` / `cancel_all_pending` only affect pending records.
//! - `destroy()` cancels pending records, waits for running ones, publishes
//!   `PoolDestroyed` and stops the background tasks.
//! - Dropping the pool without `destroy()` stops the background tasks; handles
//!   of records that never ran resolve to `TaskError::Canceled`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskpool::{ConcurrencyPool, TaskError, TaskOptions};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), taskpool::PoolError> {
//! let pool = ConcurrencyPool::new(2, "priority")?;
//!
//! let urgent = pool.add_task(
//!     || async { Ok::<_, TaskError>("urgent") },
//!     TaskOptions::new().with_priority(9),
//! )?;
//! let routine = pool.add_task(|| async { Ok::<_, TaskError>("routine") }, TaskOptions::new())?;
//!
//! assert_eq!(urgent.await, Ok("urgent"));
//! assert_eq!(routine.await, Ok("routine"));
//!
//! pool.wait_for_all_tasks(Duration::ZERO).await?;
//! let metrics = pool.destroy().await;
//! assert_eq!(metrics.total_completed, 2);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::config::wait_limit;
use crate::core::scheduler::Scheduler;
use crate::core::state::{Load, Shared};
use crate::core::{Metrics, PoolBuilder, PoolConfig, PoolPhase, PoolStatus};
use crate::error::{PoolError, TaskError, panic_info};
use crate::events::{Bus, Event, EventKind};
use crate::policies::{PolicyRef, PolicySpec, rank};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::tasks::{CompletionHandle, TaskId, TaskInfo, TaskMeta, TaskOptions, TaskRecord};

/// Reason given to records cancelled by [`ConcurrencyPool::destroy`].
const DESTROY_REASON: &str = "Pool destroyed";

/// Bounded-concurrency task pool.
///
/// All methods take `&self`; share the pool across tasks with an `Arc`.
pub struct ConcurrencyPool<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> ConcurrencyPool<T> {
    /// Creates an active pool with the given limit and policy (name or instance).
    ///
    /// # Errors
    /// - [`PoolError::InvalidArgument`] if `max_concurrency == 0`
    /// - [`PoolError::UnknownPolicy`] if the policy name is not registered
    pub fn new(max_concurrency: usize, policy: impl Into<PolicySpec>) -> Result<Self, PoolError> {
        Self::builder(PoolConfig::with_max_concurrency(max_concurrency))
            .with_policy(policy)
            .build()
    }

    /// Starts a [`PoolBuilder`] from `cfg`.
    pub fn builder(cfg: PoolConfig) -> PoolBuilder<T> {
        PoolBuilder::new(cfg)
    }

    pub(crate) fn start(
        cfg: PoolConfig,
        policy: PolicyRef,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let token = CancellationToken::new();
        let set = SubscriberSet::new(subscribers, bus.clone());
        let listener =
            (!set.is_empty()).then(|| subscriber_listener(set, bus.subscribe(), token.clone()));

        tracing::debug!(
            policy = policy.name(),
            max_concurrency = cfg.max_concurrency,
            phase = %cfg.initial_phase(),
            "pool started"
        );
        let shared = Arc::new(Shared::new(cfg, policy, bus, token, listener));
        Scheduler::spawn(Arc::clone(&shared));
        Self { shared }
    }

    /// Submits a work item and returns its completion handle.
    ///
    /// The record is queued as pending and a scheduling pass is requested; the
    /// work starts once the policy selects it and a slot is free.
    ///
    /// # Errors
    /// [`PoolError::Destroyed`] once [`destroy`](Self::destroy) has been called.
    pub fn add_task<F, Fut>(
        &self,
        work: F,
        opts: TaskOptions,
    ) -> Result<CompletionHandle<T>, PoolError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        let shared = &self.shared;
        let mut st = shared.lock();
        if st.phase == PoolPhase::Destroyed {
            return Err(PoolError::Destroyed);
        }

        let (record, handle) = TaskRecord::new(work, opts);
        let info = record.info();
        st.pending.push(record);
        st.metrics.record_submitted();
        shared.publish_load(&st);

        tracing::trace!(task = %info.meta.name, priority = info.meta.priority, pending = st.pending.len(), "task added");
        shared.publish(
            Event::new(EventKind::TaskAdded)
                .with_task(info)
                .with_load(st.pending.len(), st.running.len()),
        );
        drop(st);

        shared.request_schedule();
        Ok(handle)
    }

    /// Cancels a pending record.
    ///
    /// Returns `false` if `id` is running, finished or unknown. On success the
    /// record's handle resolves to [`TaskError::Canceled`] with `reason`.
    pub fn cancel_task(&self, id: TaskId, reason: impl Into<String>) -> bool {
        let shared = &self.shared;
        let reason = reason.into();
        let mut st = shared.lock();

        let Some(idx) = st.pending.iter().position(|r| r.id() == id) else {
            return false;
        };
        let mut record = st.pending.remove(idx);
        if !record.cancel(reason.as_str()) {
            st.pending.insert(idx, record);
            return false;
        }
        st.metrics.record_cancelled(1);
        shared.publish_load(&st);

        tracing::debug!(task = %record.meta().name, %reason, "task cancelled");
        shared.publish(
            Event::new(EventKind::TaskCancelled)
                .with_task(record.info())
                .with_reason(reason)
                .with_load(st.pending.len(), st.running.len()),
        );
        true
    }

    /// Cancels every pending record and returns how many were cancelled.
    ///
    /// Runs under the pool lock, so no record is admitted half-way through.
    pub fn cancel_all_pending(&self, reason: impl Into<String>) -> usize {
        let shared = &self.shared;
        let reason = reason.into();
        let mut st = shared.lock();

        let count = st.cancel_pending(&reason);
        shared.publish_load(&st);

        tracing::debug!(count, %reason, "pending tasks cancelled");
        shared.publish(
            Event::new(EventKind::AllPendingCancelled)
                .with_count(count)
                .with_reason(reason)
                .with_load(st.pending.len(), st.running.len()),
        );
        count
    }

    /// Stops admissions. Running records continue; idempotent.
    pub fn pause(&self) {
        let mut st = self.shared.lock();
        if st.phase != PoolPhase::Active {
            return;
        }
        st.phase = PoolPhase::Paused;
        self.shared
            .publish(Event::new(EventKind::Paused).with_phase(PoolPhase::Paused));
    }

    /// Restarts admissions and requests a scheduling pass; idempotent.
    pub fn resume(&self) {
        let mut st = self.shared.lock();
        if st.phase != PoolPhase::Paused {
            return;
        }
        st.phase = PoolPhase::Active;
        self.shared
            .publish(Event::new(EventKind::Resumed).with_phase(PoolPhase::Active));
        drop(st);
        self.shared.request_schedule();
    }

    /// Waits until nothing is pending and nothing is running.
    ///
    /// `timeout = 0s` waits forever.
    ///
    /// # Errors
    /// [`PoolError::Timeout`] with the load at the moment of giving up.
    pub async fn wait_for_all_tasks(&self, timeout: Duration) -> Result<(), PoolError> {
        let mut load = self.shared.watch_load();
        let drained = async {
            load.wait_for(Load::is_drained)
                .await
                .map(|_| ())
                .map_err(|_| PoolError::Destroyed)
        };

        match wait_limit(timeout) {
            None => drained.await?,
            Some(limit) => match tokio::time::timeout(limit, drained).await {
                Ok(res) => res?,
                Err(_elapsed) => {
                    let Load { pending, running } = self.shared.lock().load();
                    return Err(PoolError::Timeout {
                        timeout: limit,
                        pending,
                        running,
                    });
                }
            },
        }

        self.shared.publish(Event::new(EventKind::AllTasksComplete));
        Ok(())
    }

    /// Tears the pool down and returns the final metrics.
    ///
    /// Pending records are cancelled with `"Pool destroyed"`, running records
    /// are awaited (never aborted), then `PoolDestroyed` is published and the
    /// background tasks stop. Subscribers get [`PoolConfig::grace`] to process
    /// queued events and are aborted after that. Further calls only return the metrics.
    pub async fn destroy(&self) -> Metrics {
        let shared = &self.shared;
        let first = {
            let mut st = shared.lock();
            if st.phase == PoolPhase::Destroyed {
                false
            } else {
                st.phase = PoolPhase::Destroyed;
                let cancelled = st.cancel_pending(DESTROY_REASON);
                shared.publish_load(&st);
                if cancelled > 0 {
                    shared.publish(
                        Event::new(EventKind::AllPendingCancelled)
                            .with_count(cancelled)
                            .with_reason(DESTROY_REASON),
                    );
                }
                true
            }
        };

        let mut load = shared.watch_load();
        let _ = load.wait_for(Load::is_drained).await;
        let metrics = shared.lock().metrics;
        if !first {
            return metrics;
        }

        tracing::info!(
            policy = shared.policy.name(),
            submitted = metrics.total_submitted,
            completed = metrics.total_completed,
            failed = metrics.total_failed,
            cancelled = metrics.total_cancelled,
            avg_wait_ms = metrics.avg_wait.as_millis() as u64,
            avg_exec_ms = metrics.avg_exec.as_millis() as u64,
            "pool destroyed"
        );
        shared.publish(
            Event::new(EventKind::PoolDestroyed)
                .with_phase(PoolPhase::Destroyed)
                .with_metrics(metrics),
        );

        let listener = shared
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut listener) = listener {
            let grace = shared.cfg.grace;
            if tokio::time::timeout(grace, &mut listener).await.is_err() {
                tracing::warn!(
                    grace_ms = grace.as_millis() as u64,
                    "subscribers still busy after grace, aborting them"
                );
                shared.token.cancel();
                let _ = listener.await;
            }
        }
        shared.token.cancel();
        metrics
    }

    /// Owned snapshot of the pool.
    pub fn status(&self) -> PoolStatus {
        let st = self.shared.lock();
        PoolStatus {
            policy_name: self.shared.policy.name().to_string(),
            max_concurrency: self.shared.cfg.max_concurrency,
            pending_count: st.pending.len(),
            running_count: st.running.len(),
            completed_count: st.history.len(),
            phase: st.phase,
            metrics: st.metrics,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.shared.lock().pending.len()
    }

    pub fn running_count(&self) -> usize {
        self.shared.lock().running.len()
    }

    /// Records that finished executing (completed or failed).
    pub fn completed_count(&self) -> usize {
        self.shared.lock().history.len()
    }

    pub fn total_submitted(&self) -> u64 {
        self.shared.lock().metrics.total_submitted
    }

    /// Free slots: `max_concurrency - running`.
    pub fn available_slots(&self) -> usize {
        let running = self.shared.lock().running.len();
        self.shared.cfg.max_concurrency.saturating_sub(running)
    }

    /// Snapshot of a record, whether pending, running or finished.
    ///
    /// Cancelled records are not retained and return `None`.
    pub fn task_info(&self, id: TaskId) -> Option<TaskInfo> {
        self.shared.lock().find(id)
    }

    /// Finished records (completed and failed), in completion order.
    pub fn history(&self) -> Vec<TaskInfo> {
        self.shared.lock().history.clone()
    }

    /// Admission order the policy would produce for the current pending set.
    ///
    /// Falls back to submission order if the policy panics.
    pub fn pending_order(&self) -> Vec<TaskId> {
        let st = self.shared.lock();
        let metas: Vec<&TaskMeta> = st.pending.iter().map(|r| r.meta()).collect();
        let now = Instant::now();

        match panic::catch_unwind(AssertUnwindSafe(|| {
            rank(&*self.shared.policy, &metas, now)
        })) {
            Ok(order) => order,
            Err(payload) => {
                tracing::warn!(
                    policy = self.shared.policy.name(),
                    info = %panic_info(&*payload),
                    "policy panicked while ranking"
                );
                metas.iter().map(|m| m.id).collect()
            }
        }
    }

    /// Receiver for every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }
}

impl<T> Drop for ConcurrencyPool<T> {
    fn drop(&mut self) {
        self.shared.token.cancel();
    }
}

/// Forwards bus events to the subscriber set until `PoolDestroyed` or cancellation.
///
/// Subscriber overflow/panic events stay on the bus and are not fed back into the set.
/// Workers are flushed on exit unless the token is cancelled first.
fn subscriber_listener(
    set: SubscriberSet,
    mut rx: broadcast::Receiver<Event>,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                res = rx.recv() => match res {
                    Ok(ev) if ev.is_subscriber_overflow() || ev.is_subscriber_panic() => {}
                    Ok(ev) => {
                        let last = ev.kind == EventKind::PoolDestroyed;
                        set.emit(&ev);
                        if last {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = token.cancelled() => break,
            }
        }
        tokio::select! {
            _ = set.shutdown() => {}
            _ = token.cancelled() => tracing::debug!("subscriber workers aborted"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};

    use async_trait::async_trait;
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use tokio::time::sleep;

    use crate::events::TaskOutcome;
    use crate::policies::{SchedulingPolicy, by_submission};
    use crate::tasks::TaskState;

    type Log = Arc<Mutex<Vec<&'static str>>>;
    type Job = Box<dyn FnOnce() -> BoxFuture<'static, Result<&'static str, TaskError>> + Send>;

    /// Work that logs its start, sleeps `ms` and returns its name.
    fn job(name: &'static str, ms: u64, log: &Log) -> Job {
        let log = Arc::clone(log);
        Box::new(move || {
            async move {
                log.lock().unwrap().push(name);
                sleep(Duration::from_millis(ms)).await;
                Ok::<_, TaskError>(name)
            }
            .boxed()
        })
    }

    fn opts(name: &'static str, ms: u64) -> TaskOptions {
        TaskOptions::new()
            .with_name(name)
            .with_expected_duration(Duration::from_millis(ms))
    }

    fn paused(max: usize, policy: impl Into<PolicySpec>) -> ConcurrencyPool<&'static str> {
        ConcurrencyPool::builder(PoolConfig {
            max_concurrency: max,
            auto_start: false,
            ..PoolConfig::default()
        })
        .with_policy(policy)
        .build()
        .unwrap()
    }

    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn fifo_admits_in_submission_order() {
        let log = Log::default();
        let pool = paused(1, "fifo");
        for name in ["a", "b", "c"] {
            pool.add_task(job(name, 10, &log), opts(name, 10)).unwrap();
        }
        pool.resume();
        pool.wait_for_all_tasks(Duration::ZERO).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn lpt_runs_longest_first() {
        let log = Log::default();
        let pool = paused(1, "LPT");
        for (name, ms) in [("A", 100), ("B", 500), ("C", 50)] {
            pool.add_task(job(name, ms, &log), opts(name, ms)).unwrap();
        }
        pool.resume();
        pool.wait_for_all_tasks(Duration::ZERO).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["B", "A", "C"]);
    }

    #[tokio::test(start_paused = true)]
    async fn priority_runs_highest_first() {
        let log = Log::default();
        let pool = paused(1, "priority");
        pool.add_task(job("X", 10, &log), opts("X", 10).with_priority(1))
            .unwrap();
        pool.add_task(job("Y", 10, &log), opts("Y", 10).with_priority(9))
            .unwrap();
        assert_eq!(pool.pending_order().len(), 2);
        pool.resume();
        pool.wait_for_all_tasks(Duration::ZERO).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["Y", "X"]);
    }

    #[tokio::test(start_paused = true)]
    async fn running_never_exceeds_limit() {
        let pool = ConcurrencyPool::new(2, "fifo").unwrap();
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..6 {
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            pool.add_task(
                move || async move {
                    let now = current.fetch_add(1, AtomicOrdering::SeqCst) + 1;
                    peak.fetch_max(now, AtomicOrdering::SeqCst);
                    sleep(Duration::from_millis(100)).await;
                    current.fetch_sub(1, AtomicOrdering::SeqCst);
                    Ok::<_, TaskError>(())
                },
                TaskOptions::new(),
            )
            .unwrap();
        }

        sleep(Duration::from_millis(1)).await;
        assert_eq!(pool.running_count(), 2);
        assert_eq!(pool.pending_count(), 4);
        assert_eq!(pool.available_slots(), 0);

        pool.wait_for_all_tasks(Duration::ZERO).await.unwrap();
        assert_eq!(peak.load(AtomicOrdering::SeqCst), 2);
        assert_eq!(pool.completed_count(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_order_follows_durations() {
        let log = Log::default();
        let pool = ConcurrencyPool::new(2, "fifo").unwrap();
        let t0 = Instant::now();

        let h1 = pool.add_task(job("1", 300, &log), opts("1", 300)).unwrap();
        let h2 = pool.add_task(job("2", 200, &log), opts("2", 200)).unwrap();
        let h3 = pool.add_task(job("3", 400, &log), opts("3", 400)).unwrap();
        let third = h3.id();

        pool.wait_for_all_tasks(Duration::ZERO).await.unwrap();
        let finished: Vec<String> = pool
            .history()
            .iter()
            .map(|i| i.meta.name.to_string())
            .collect();
        assert_eq!(finished, vec!["2", "1", "3"]);

        let ended = pool.task_info(third).unwrap().ended_at.unwrap();
        let elapsed = ended - t0;
        assert!(
            elapsed >= Duration::from_millis(600) && elapsed < Duration::from_millis(610),
            "elapsed={elapsed:?}"
        );
        assert_eq!((h1.await, h2.await, h3.await), (Ok("1"), Ok("2"), Ok("3")));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_gives_up_after_timeout() {
        let log = Log::default();
        let pool = ConcurrencyPool::new(1, "fifo").unwrap();
        pool.add_task(job("slow", 500, &log), opts("slow", 500))
            .unwrap();

        let err = pool
            .wait_for_all_tasks(Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PoolError::Timeout {
                timeout: Duration::from_millis(50),
                pending: 0,
                running: 1,
            }
        );
        assert_eq!(err.as_label(), "pool_timeout");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_only_touches_pending() {
        let log = Log::default();
        let pool = ConcurrencyPool::new(1, "fifo").unwrap();
        let running = pool.add_task(job("run", 100, &log), opts("run", 100)).unwrap();
        let queued = pool.add_task(job("skip", 10, &log), opts("skip", 10)).unwrap();
        sleep(Duration::from_millis(1)).await;

        assert!(!pool.cancel_task(running.id(), "too late"));
        assert!(!pool.cancel_task(TaskId::next(), "unknown"));

        let mut rx = pool.subscribe();
        let queued_id = queued.id();
        assert!(pool.cancel_task(queued_id, "not needed"));
        assert!(!pool.cancel_task(queued_id, "twice"));
        assert_eq!(
            queued.await,
            Err(TaskError::Canceled {
                reason: "not needed".into()
            })
        );

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::TaskCancelled);
        assert_eq!(ev.task_name(), Some("skip"));
        assert_eq!(ev.reason.as_deref(), Some("not needed"));

        assert_eq!(running.await, Ok("run"));
        pool.wait_for_all_tasks(Duration::ZERO).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["run"]);
        assert_eq!(pool.status().metrics.total_cancelled, 1);
        assert!(pool.task_info(queued_id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_pending_rejects_every_handle() {
        let log = Log::default();
        let pool = paused(2, "fifo");
        let handles: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|n| pool.add_task(job(n, 10, &log), opts(n, 10)).unwrap())
            .collect();
        let mut rx = pool.subscribe();

        assert_eq!(pool.cancel_all_pending("shutdown"), 3);
        assert_eq!(pool.pending_count(), 0);
        for h in handles {
            assert!(h.await.unwrap_err().is_canceled());
        }

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::AllPendingCancelled);
        assert_eq!(ev.count, Some(3));

        let m = pool.status().metrics;
        assert_eq!((m.total_submitted, m.total_cancelled), (3, 3));
        pool.wait_for_all_tasks(Duration::from_millis(1)).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn pause_blocks_admission_until_resume() {
        let log = Log::default();
        let pool = paused(1, "fifo");
        assert_eq!(pool.status().phase, PoolPhase::Paused);

        let h = pool.add_task(job("held", 10, &log), opts("held", 10)).unwrap();
        sleep(Duration::from_millis(50)).await;
        assert_eq!((pool.pending_count(), pool.running_count()), (1, 0));

        let mut rx = pool.subscribe();
        pool.resume();
        pool.resume();
        assert_eq!(h.await, Ok("held"));
        pool.pause();
        pool.pause();

        let transitions: Vec<EventKind> = drain(&mut rx)
            .into_iter()
            .map(|e| e.kind)
            .filter(|k| matches!(k, EventKind::Paused | EventKind::Resumed))
            .collect();
        assert_eq!(transitions, vec![EventKind::Resumed, EventKind::Paused]);
        assert_eq!(pool.status().phase, PoolPhase::Paused);
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_drains_running_and_rejects_new_work() {
        let log = Log::default();
        let pool = ConcurrencyPool::new(1, "fifo").unwrap();
        let running = pool.add_task(job("run", 100, &log), opts("run", 100)).unwrap();
        let queued = pool.add_task(job("queued", 10, &log), opts("queued", 10)).unwrap();
        sleep(Duration::from_millis(1)).await;

        let mut rx = pool.subscribe();
        let metrics = pool.destroy().await;
        assert_eq!(running.await, Ok("run"));
        assert_eq!(
            queued.await,
            Err(TaskError::Canceled {
                reason: "Pool destroyed".into()
            })
        );
        assert_eq!((metrics.total_completed, metrics.total_cancelled), (1, 1));

        let status = pool.status();
        assert_eq!((status.pending_count, status.running_count), (0, 0));
        assert_eq!(status.phase, PoolPhase::Destroyed);

        let err = pool.add_task(job("late", 1, &log), opts("late", 1)).unwrap_err();
        assert_eq!(err, PoolError::Destroyed);

        pool.resume();
        assert_eq!(pool.status().phase, PoolPhase::Destroyed);
        assert_eq!(pool.destroy().await, metrics);

        let last = drain(&mut rx).pop().unwrap();
        assert_eq!(last.kind, EventKind::PoolDestroyed);
        assert_eq!(last.metrics, Some(metrics));
    }

    #[tokio::test(start_paused = true)]
    async fn metrics_count_every_outcome() {
        let pool: ConcurrencyPool<u32> = ConcurrencyPool::builder(PoolConfig {
            max_concurrency: 2,
            auto_start: false,
            ..PoolConfig::default()
        })
        .build()
        .unwrap();

        for i in 0..3 {
            pool.add_task(
                move || async move {
                    sleep(Duration::from_millis(20)).await;
                    Ok::<_, TaskError>(i)
                },
                TaskOptions::new(),
            )
            .unwrap();
        }
        let failed = pool
            .add_task(|| async { Err::<u32, _>(TaskError::fail("boom")) }, TaskOptions::new())
            .unwrap();
        async fn explode() -> Result<u32, TaskError> {
            panic!("kaboom")
        }
        let panicked = pool.add_task(explode, TaskOptions::new()).unwrap();
        for _ in 0..2 {
            let h = pool
                .add_task(|| async { Ok::<u32, TaskError>(0) }, TaskOptions::new())
                .unwrap();
            assert!(pool.cancel_task(h.id(), "skip"));
        }

        let mut rx = pool.subscribe();
        pool.resume();
        pool.wait_for_all_tasks(Duration::ZERO).await.unwrap();

        assert_eq!(failed.await, Err(TaskError::fail("boom")));
        assert!(matches!(panicked.await, Err(TaskError::Panicked { .. })));

        let m = pool.status().metrics;
        assert_eq!(m.total_submitted, 7);
        assert_eq!(m.total_completed, 3);
        assert_eq!(m.total_failed, 2);
        assert_eq!(m.total_cancelled, 2);
        assert_eq!(m.max_exec, Duration::from_millis(20));
        assert_eq!(pool.completed_count(), 5);

        let failures = drain(&mut rx)
            .into_iter()
            .filter(|e| e.outcome == Some(TaskOutcome::Failed))
            .count();
        assert_eq!(failures, 2);
        assert!(
            pool.history()
                .iter()
                .all(|i| matches!(i.state, TaskState::Completed | TaskState::Failed))
        );
    }

    struct Flaky(AtomicBool);

    impl SchedulingPolicy for Flaky {
        fn name(&self) -> &str {
            "FLAKY"
        }

        fn compare(&self, a: &TaskMeta, b: &TaskMeta, _now: Instant) -> Ordering {
            if self.0.swap(false, AtomicOrdering::SeqCst) {
                panic!("flaky comparator");
            }
            by_submission(a, b)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn policy_panic_aborts_one_pass_only() {
        let log = Log::default();
        let policy: PolicyRef = Arc::new(Flaky(AtomicBool::new(true)));
        let pool = paused(2, policy);
        pool.add_task(job("a", 10, &log), opts("a", 10)).unwrap();
        pool.add_task(job("b", 10, &log), opts("b", 10)).unwrap();

        let mut rx = pool.subscribe();
        pool.resume();
        sleep(Duration::from_millis(1)).await;
        assert_eq!(pool.running_count(), 0);

        let err = drain(&mut rx)
            .into_iter()
            .find(|e| e.kind == EventKind::SchedulerError)
            .unwrap();
        assert!(err.reason.unwrap().contains("flaky comparator"));

        pool.add_task(job("c", 10, &log), opts("c", 10)).unwrap();
        pool.wait_for_all_tasks(Duration::ZERO).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    struct Recorder(Arc<Mutex<Vec<EventKind>>>);

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().unwrap().push(ev.kind);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_lifecycle_until_destroy() {
        let log = Log::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Recorder(Arc::clone(&seen)))];
        let pool = ConcurrencyPool::builder(PoolConfig::default())
            .with_subscribers(subs)
            .build()
            .unwrap();

        pool.add_task(job("only", 10, &log), opts("only", 10)).unwrap();
        pool.wait_for_all_tasks(Duration::ZERO).await.unwrap();
        pool.destroy().await;

        let seen = seen.lock().unwrap();
        for kind in [
            EventKind::TaskAdded,
            EventKind::TaskStarted,
            EventKind::TaskComplete,
            EventKind::Idle,
            EventKind::AllTasksComplete,
        ] {
            assert!(seen.contains(&kind), "missing {kind:?} in {seen:?}");
        }
        assert_eq!(seen.last(), Some(&EventKind::PoolDestroyed));
    }

    struct Stuck;

    #[async_trait]
    impl Subscribe for Stuck {
        async fn on_event(&self, _ev: &Event) {
            std::future::pending::<()>().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_aborts_subscribers_after_grace() {
        let log = Log::default();
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Stuck)];
        let pool = ConcurrencyPool::builder(PoolConfig {
            grace: Duration::from_secs(1),
            ..PoolConfig::default()
        })
        .with_subscribers(subs)
        .build()
        .unwrap();

        let h = pool.add_task(job("only", 10, &log), opts("only", 10)).unwrap();
        assert_eq!(h.await, Ok("only"));

        let started = Instant::now();
        let metrics = tokio::time::timeout(Duration::from_secs(3600), pool.destroy())
            .await
            .expect("destroy must not wait on a stuck subscriber");
        assert_eq!(metrics.total_completed, 1);
        assert!(started.elapsed() <= Duration::from_millis(1010));
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_limit_runs_everything_at_once() {
        let log = Log::default();
        let pool = ConcurrencyPool::new(usize::MAX, "fifo").unwrap();
        let handles: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|name| pool.add_task(job(name, 100, &log), opts(name, 100)).unwrap())
            .collect();

        let started = Instant::now();
        for h in handles {
            assert!(h.await.is_ok());
        }
        assert!(started.elapsed() < Duration::from_millis(200));
        assert_eq!(pool.available_slots(), usize::MAX);
        pool.destroy().await;
    }

    #[tokio::test(start_paused = true)]
    async fn settled_handle_sees_terminal_snapshot() {
        let log = Log::default();
        let pool = ConcurrencyPool::new(1, "fifo").unwrap();
        let mut rx = pool.subscribe();

        let h = pool.add_task(job("one", 10, &log), opts("one", 10)).unwrap();
        let id = h.id();
        assert_eq!(h.await, Ok("one"));

        let info = pool.task_info(id).unwrap();
        assert_eq!(info.state, TaskState::Completed);
        assert_eq!(pool.running_count(), 0);
        assert_eq!(pool.history().len(), 1);

        let done = drain(&mut rx)
            .into_iter()
            .find(|e| e.kind == EventKind::TaskComplete)
            .unwrap();
        assert_eq!(done.task.map(|t| t.state), Some(TaskState::Completed));
    }

    #[tokio::test(start_paused = true)]
    async fn task_info_follows_the_record() {
        let log = Log::default();
        let pool = paused(1, "priority");
        let low = pool.add_task(job("low", 10, &log), opts("low", 10).with_priority(1)).unwrap();
        let high = pool.add_task(job("high", 10, &log), opts("high", 10).with_priority(9)).unwrap();
        let mid = pool.add_task(job("mid", 10, &log), opts("mid", 10).with_priority(5)).unwrap();
        let (low, high, mid) = (low.id(), high.id(), mid.id());

        assert_eq!(pool.pending_order(), vec![high, mid, low]);
        assert_eq!(pool.task_info(high).unwrap().state, TaskState::Pending);
        assert_eq!(pool.total_submitted(), 3);

        pool.resume();
        pool.wait_for_all_tasks(Duration::ZERO).await.unwrap();
        let info = pool.task_info(low).unwrap();
        assert_eq!(info.state, TaskState::Completed);
        assert_eq!(info.duration(), Some(Duration::from_millis(10)));
        assert!(pool.pending_order().is_empty());
    }

    #[tokio::test]
    async fn construction_validates_arguments() {
        let zero = ConcurrencyPool::<()>::new(0, "fifo").err().unwrap();
        assert_eq!(zero.as_label(), "pool_invalid_argument");

        match ConcurrencyPool::<()>::new(1, "round-robin").err().unwrap() {
            PoolError::UnknownPolicy { name, available } => {
                assert_eq!(name, "round-robin");
                assert!(available.contains(&"WEIGHTED"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn dropping_the_pool_rejects_queued_handles() {
        let log = Log::default();
        let pool = paused(1, "fifo");
        let h = pool.add_task(job("never", 10, &log), opts("never", 10)).unwrap();
        drop(pool);
        assert!(h.await.unwrap_err().is_canceled());
        assert!(log.lock().unwrap().is_empty());
    }
}
