//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out
//! that delivers pool events to subscribers registered through
//! [`PoolBuilder::with_subscribers`](crate::PoolBuilder::with_subscribers).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   scheduler loop / pool API ── publish(Event) ──► Bus ──► listener task
//!                                                              │
//!                                                        SubscriberSet::emit
//!                                                              │
//!                                                   ┌──────────┼──────────┐
//!                                                   ▼          ▼          ▼
//!                                               LogWriter   Custom      ...
//! ```

mod embedded;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
