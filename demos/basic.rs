//! # Example: basic
//!
//! Runs the same batch of jobs through a pool with each scheduling policy and
//! prints the admission order, the final metrics and every pool event through
//! the built-in [`LogWriter`].
//!
//! Shows how to:
//! - Build a pool with [`ConcurrencyPool::builder`] and attach subscribers.
//! - Submit work with [`TaskOptions`] (priority, expected duration, name).
//! - Pause admissions, cancel a pending record, resume and drain.
//! - Tear the pool down with [`ConcurrencyPool::destroy`].
//!
//! ## Flow
//! ```text
//! for policy in available_policies():
//!     pool (auto_start = false) ──► add_task × 6 ──► pending_order()
//!         ├─► cancel_task(one)
//!         ├─► resume() ──► scheduler admits by policy (max 2 at once)
//!         ├─► wait_for_all_tasks()
//!         └─► destroy() ──► Metrics
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example basic --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use taskpool::{
    ConcurrencyPool, LogWriter, PoolConfig, Subscribe, TaskError, TaskOptions, available_policies,
};
use tracing_subscriber::EnvFilter;

/// (name, priority, expected duration in ms)
const JOBS: &[(&str, i32, u64)] = &[
    ("thumbnail", 2, 80),
    ("reindex", 1, 400),
    ("invoice", 9, 120),
    ("backup", 0, 600),
    ("email", 5, 40),
    ("report", 3, 250),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    for policy in available_policies() {
        run_batch(policy).await?;
    }
    Ok(())
}

async fn run_batch(policy: &str) -> anyhow::Result<()> {
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let pool = ConcurrencyPool::builder(PoolConfig {
        max_concurrency: 2,
        auto_start: false,
        ..PoolConfig::default()
    })
    .with_policy(policy)
    .with_subscribers(subs)
    .build()?;

    let mut handles = Vec::with_capacity(JOBS.len());
    for &(name, priority, ms) in JOBS {
        let opts = TaskOptions::new()
            .with_name(name)
            .with_priority(priority)
            .with_expected_duration(Duration::from_millis(ms));
        let handle = pool.add_task(
            move || async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                if name == "reindex" {
                    return Err(TaskError::fail("index locked"));
                }
                Ok(name)
            },
            opts,
        )?;
        handles.push(handle);
    }

    let order: Vec<String> = pool
        .pending_order()
        .into_iter()
        .filter_map(|id| pool.task_info(id))
        .map(|info| info.meta.name.to_string())
        .collect();
    println!("\n== {policy}: planned order {order:?}");

    // Cancel one record while the pool is still paused.
    if let Some(report) = handles.iter().find(|h| {
        pool.task_info(h.id())
            .is_some_and(|info| &*info.meta.name == "report")
    }) {
        pool.cancel_task(report.id(), "skipped for today");
    }

    pool.resume();
    pool.wait_for_all_tasks(Duration::from_secs(10)).await?;

    for handle in handles {
        match handle.await {
            Ok(name) => println!("   ok      {name}"),
            Err(err) => println!("   {:<7} {}", err.as_label(), err.as_message()),
        }
    }

    let m = pool.destroy().await;
    println!(
        "   metrics: submitted={} completed={} failed={} cancelled={} avg_wait={:?} avg_exec={:?}",
        m.total_submitted, m.total_completed, m.total_failed, m.total_cancelled, m.avg_wait, m.avg_exec
    );
    Ok(())
}
