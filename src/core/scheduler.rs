//! # Scheduler loop: the only place admissions and completions happen.
//!
//! ```text
//! loop select! (biased):
//!   ├─ token.cancelled()          ──► exit
//!   ├─ done_rx.recv() → record    ──► on_task_complete(record), pass()
//!   └─ schedule.notified()        ──► pass()
//!
//! pass():
//!   phase != Active ──► return
//!   while running < max && pending non-empty:
//!     idx = select_next(policy, pending)     (policy panic ──► SchedulerError, abort pass)
//!     record = pending.remove(idx); work = record.start()
//!     running.insert(id, snapshot); publish TaskStarted
//!     spawn { record.run(work).await; done_tx.send(record) }
//!
//! on_task_complete(record):
//!   running ──► history, metrics ──► record.release() (handle settles) ──► TaskComplete
//!   pending and running empty ──► publish Idle
//! ```
//!
//! A signal raised while a pass runs is stored by the `Notify` and consumed
//! by the next iteration, so passes never overlap.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::core::PoolPhase;
use crate::core::state::Shared;
use crate::error::panic_info;
use crate::events::{Event, EventKind, TaskOutcome};
use crate::policies::select_next;
use crate::tasks::{TaskRecord, TaskState};

pub(crate) struct Scheduler<T> {
    shared: Arc<Shared<T>>,
    done_tx: mpsc::UnboundedSender<TaskRecord<T>>,
}

impl<T: Send + 'static> Scheduler<T> {
    /// Spawns the loop for `shared`.
    ///
    /// The completion channel is unbounded: at most `max_concurrency` records
    /// are ever in flight, and any `usize` limit is accepted.
    pub fn spawn(shared: Arc<Shared<T>>) {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let scheduler = Self { shared, done_tx };
        tokio::spawn(scheduler.run(done_rx));
    }

    async fn run(self, mut done_rx: mpsc::UnboundedReceiver<TaskRecord<T>>) {
        let token = self.shared.token.clone();
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                Some(record) = done_rx.recv() => {
                    self.on_task_complete(record);
                    self.pass();
                }
                _ = self.shared.schedule.notified() => self.pass(),
            }
        }
        tracing::debug!(policy = self.shared.policy.name(), "scheduler loop stopped");
    }

    /// Admits pending records while slots are free.
    fn pass(&self) {
        let shared = &self.shared;
        let mut st = shared.lock();
        if st.phase != PoolPhase::Active {
            return;
        }

        let max = shared.cfg.max_concurrency;
        while st.running.len() < max && !st.pending.is_empty() {
            let now = Instant::now();
            let picked = panic::catch_unwind(AssertUnwindSafe(|| {
                select_next(&*shared.policy, st.pending.iter().map(|r| r.meta()), now)
            }));
            let idx = match picked {
                Ok(Some(idx)) => idx,
                Ok(None) => break,
                Err(payload) => {
                    let info = panic_info(&*payload);
                    tracing::error!(policy = shared.policy.name(), %info, "policy panicked, pass aborted");
                    shared.publish_load(&st);
                    shared.publish(
                        Event::new(EventKind::SchedulerError)
                            .with_reason(format!("policy {} panicked: {info}", shared.policy.name())),
                    );
                    return;
                }
            };

            let mut record = st.pending.remove(idx);
            let work = match record.start() {
                Ok(work) => work,
                Err(err) => {
                    tracing::error!(task = %record.id(), error = %err, "pending record could not start");
                    shared.publish(Event::new(EventKind::SchedulerError).with_reason(err.as_message()));
                    continue;
                }
            };

            let info = record.info();
            st.running.insert(info.id(), info.clone());
            tracing::debug!(
                task = %info.meta.name,
                wait_ms = info.wait_time().as_millis() as u64,
                running = st.running.len(),
                pending = st.pending.len(),
                "task admitted"
            );
            shared.publish(
                Event::new(EventKind::TaskStarted)
                    .with_task(info)
                    .with_load(st.pending.len(), st.running.len()),
            );

            let done_tx = self.done_tx.clone();
            tokio::spawn(async move {
                record.run(work).await;
                // The loop is gone only after the pool was dropped.
                if let Err(mpsc::error::SendError(mut record)) = done_tx.send(record) {
                    record.release();
                }
            });
        }

        shared.publish_load(&st);
        if st.load().is_drained() {
            shared.publish(Event::new(EventKind::Idle));
        }
    }

    /// Moves a finished record from `running` into `history` and accounts it.
    fn on_task_complete(&self, mut record: TaskRecord<T>) {
        let shared = &self.shared;
        let info = record.info();

        let mut st = shared.lock();
        st.running.remove(&info.id());
        st.metrics.record_finished(&info, shared.cfg.enable_metrics);
        st.history.push(info.clone());
        shared.publish_load(&st);
        record.release();

        let mut ev = Event::new(EventKind::TaskComplete).with_load(st.pending.len(), st.running.len());
        match (info.state, info.failure.as_ref()) {
            (TaskState::Failed, Some(err)) => {
                tracing::debug!(task = %info.meta.name, error = %err, "task failed");
                ev = ev.with_outcome(TaskOutcome::Failed).with_reason(err.as_message());
            }
            _ => {
                tracing::debug!(task = %info.meta.name, "task completed");
                ev = ev.with_outcome(TaskOutcome::Completed);
            }
        }
        shared.publish(ev.with_task(info));
    }
}
