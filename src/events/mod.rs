//! Pool events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the pool API, the scheduler loop
//! and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`], [`TaskOutcome`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `ConcurrencyPool` API calls (add/cancel/pause/resume/destroy),
//!   the scheduler loop (admissions, completions, idle, scheduler errors),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the pool's subscriber listener (fans out to `SubscriberSet`)
//!   and any receiver obtained from `ConcurrencyPool::subscribe`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind, TaskOutcome};
