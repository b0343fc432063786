//! Scheduling policies.
//!
//! This module groups the orderings that decide **which** pending record is
//! admitted next when a concurrency slot frees up.
//!
//! ## Contents
//! - [`SchedulingPolicy`] the comparator contract, [`PolicyRef`] shared handle
//! - [`Fifo`], [`Lpt`], [`Spt`], [`Priority`] key-based orderings
//! - [`Weighted`] composite score over priority, expected duration and wait time
//! - [`from_name`] / [`available_policies`] lookup-table factory
//!
//! ## Quick wiring
//! ```text
//! PoolConfig { weighted: WeightedConfig, .. } + PolicySpec
//!      └─► PolicySpec::resolve() ─► PolicyRef
//!           └─► core::scheduler pass uses:
//!                - select_next(policy, pending, now) to pick the next admission
//! ```
//!
//! ## Tie-break
//! Every built-in policy ends with [`by_submission`]: `created_at`, then `id`.

mod ordering;
mod policy;
mod weighted;

pub use ordering::{Fifo, Lpt, Priority, Spt};
pub use policy::{
    PolicyRef, PolicySpec, SchedulingPolicy, available_policies, by_submission, from_name, rank,
    select_next,
};
pub use weighted::{Weighted, WeightedConfig};
