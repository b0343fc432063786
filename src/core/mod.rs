//! Runtime core: the pool, its scheduler loop and bookkeeping.
//!
//! The public API from this module is [`ConcurrencyPool`] with its
//! [`PoolBuilder`], [`PoolConfig`] and the [`PoolStatus`]/[`Metrics`] snapshots.
//!
//! Internal modules:
//! - `scheduler`: the single loop that admits pending records and accounts finished ones;
//! - `state`: state shared between the pool handle and the loop;
//! - `metrics`: counters and timing aggregates.

mod builder;
mod config;
mod metrics;
mod pool;
mod scheduler;
mod state;

pub use builder::PoolBuilder;
pub use config::PoolConfig;
pub use metrics::Metrics;
pub use pool::ConcurrencyPool;
pub use state::{PoolPhase, PoolStatus};
