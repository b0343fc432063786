//! # taskpool
//!
//! **Taskpool** is a bounded-concurrency task scheduler for tokio.
//!
//! Work items are submitted at any time, at most `max_concurrency` of them run
//! at once, and a swappable [`SchedulingPolicy`] decides which pending item is
//! admitted next whenever a slot frees up. The pool exposes lifecycle controls
//! (pause, resume, cancel, drain, destroy), live status and metrics, and a typed
//! event stream.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   add_task(work, TaskOptions)          add_task(...)           add_task(...)
//!            │                                 │                       │
//!            ▼                                 ▼                       ▼
//! ┌───────────────────────────────────────────────────────────────────────────┐
//! │  ConcurrencyPool                                                          │
//! │  - pending: Vec<TaskRecord>      (ranked by the SchedulingPolicy)         │
//! │  - running: TaskId → TaskInfo    (len ≤ max_concurrency)                  │
//! │  - history: Vec<TaskInfo>        (completed + failed)                     │
//! │  - metrics: Metrics                                                       │
//! └──────┬────────────────────────────────────────────────────────────▲───────┘
//!        │ Notify (capacity-1 "schedule requested")                   │
//!        ▼                                                            │ mpsc(TaskRecord)
//! ┌──────────────────────────┐   tokio::spawn   ┌──────────────────┐  │
//! │  scheduler loop (single) │ ───────────────► │ record.run(work) │ ─┘
//! │  pass(): select_next()   │                  └──────────────────┘
//! └──────┬───────────────────┘
//!        │ publishes TaskStarted / TaskComplete / Idle / SchedulerError ...
//!        ▼
//! ┌───────────────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                            │
//! │                   (capacity: PoolConfig::bus_capacity)                    │
//! └─────────────────┬───────────────────────────────────────┬─────────────────┘
//!                   ▼                                       ▼
//!       ┌────────────────────────┐                pool.subscribe() receivers
//!       │  subscriber_listener   │
//!       └───────────┬────────────┘
//!                   ▼
//!             SubscriberSet (per-subscriber queues)
//!         ┌─────────┼─────────┐
//!         ▼         ▼         ▼
//!      sub1.on   sub2.on   subN.on
//!      _event()  _event()  _event()
//! ```
//!
//! ### Lifecycle of a record
//! ```text
//! Pending ──admit──► Running ──Ok──────► Completed   (handle ◄─ Ok(value))
//!    │                  └────Err/panic─► Failed      (handle ◄─ Err(TaskError))
//!    └──cancel──► Cancelled                          (handle ◄─ Err(Canceled))
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                              |
//! |-------------------|---------------------------------------------------------------|-------------------------------------------------|
//! | **Pool**          | Bounded admission, pause/resume, cancel, drain, destroy.      | [`ConcurrencyPool`], [`PoolBuilder`]            |
//! | **Policies**      | FIFO, LPT, SPT, priority and weighted orderings.              | [`SchedulingPolicy`], [`PolicySpec`]            |
//! | **Tasks**         | Records, options, handles and snapshots.                      | [`TaskRecord`], [`TaskOptions`], [`CompletionHandle`] |
//! | **Subscriber API**| Hook into pool events (logging, metrics, custom subscribers). | [`Subscribe`], [`Event`]                        |
//! | **Errors**        | Typed errors for the pool and for work items.                 | [`PoolError`], [`TaskError`]                    |
//! | **Configuration** | Centralize pool settings.                                     | [`PoolConfig`], [`WeightedConfig`]              |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] subscriber that renders events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use taskpool::{ConcurrencyPool, PoolConfig, TaskError, TaskOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn taskpool::Subscribe>> = vec![Arc::new(taskpool::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn taskpool::Subscribe>> = Vec::new();
//!
//!     let pool = ConcurrencyPool::builder(PoolConfig::with_max_concurrency(2))
//!         .with_policy("lpt")
//!         .with_subscribers(subs)
//!         .build()?;
//!
//!     let mut handles = Vec::new();
//!     for ms in [100u64, 500, 50] {
//!         let opts = TaskOptions::new().with_expected_duration(Duration::from_millis(ms));
//!         handles.push(pool.add_task(
//!             move || async move {
//!                 tokio::time::sleep(Duration::from_millis(ms)).await;
//!                 Ok::<_, TaskError>(ms)
//!             },
//!             opts,
//!         )?);
//!     }
//!
//!     pool.wait_for_all_tasks(Duration::from_secs(5)).await?;
//!     for h in handles {
//!         println!("finished after {}ms", h.await?);
//!     }
//!
//!     let metrics = pool.destroy().await;
//!     assert_eq!(metrics.total_completed, 3);
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use core::{ConcurrencyPool, Metrics, PoolBuilder, PoolConfig, PoolPhase, PoolStatus};
pub use error::{PoolError, TaskError};
pub use events::{Event, EventKind, TaskOutcome};
pub use policies::{
    Fifo, Lpt, PolicyRef, PolicySpec, Priority, SchedulingPolicy, Spt, Weighted, WeightedConfig,
    available_policies, by_submission, from_name, rank, select_next,
};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{
    CompletionHandle, TaskId, TaskInfo, TaskMeta, TaskOptions, TaskRecord, TaskState,
};

// Optional: expose a built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
