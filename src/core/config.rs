//! # Pool configuration.
//!
//! Provides [`PoolConfig`], the settings consumed by
//! [`ConcurrencyPool::builder`](crate::ConcurrencyPool::builder).
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 by [`PoolConfig::bus_capacity_clamped`]
//! - `wait_for_all_tasks(0s)` → wait forever (see [`wait_limit`])
//! - `grace = 0s` → `destroy()` does not wait for subscribers to flush

use std::time::Duration;

use crate::core::PoolPhase;
use crate::error::PoolError;
use crate::policies::WeightedConfig;

/// Configuration of a [`ConcurrencyPool`](crate::ConcurrencyPool).
///
/// ## Field semantics
/// - `max_concurrency`: upper bound on simultaneously running records (must be `>= 1`)
/// - `auto_start`: `true` starts `Active`; `false` starts `Paused` until `resume()`
/// - `enable_metrics`: maintain wait/exec means and maxima (counters are always kept)
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `weighted`: parameters of the `WEIGHTED` policy when it is selected by name
/// - `grace`: how long `destroy()` lets subscribers flush queued events
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Maximum number of records running at once.
    pub max_concurrency: usize,

    /// Start admitting immediately.
    pub auto_start: bool,

    /// Track timing aggregates.
    pub enable_metrics: bool,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers that lag behind more than `bus_capacity` events get `Lagged`
    /// and skip older items.
    pub bus_capacity: usize,

    /// Weighted policy parameters.
    pub weighted: WeightedConfig,

    /// Maximum time `destroy()` waits for subscriber workers after `PoolDestroyed`.
    ///
    /// - Running work is always awaited in full; this only bounds event delivery
    /// - Workers still busy when it expires are aborted
    pub grace: Duration,
}

impl PoolConfig {
    /// Config with the given concurrency limit and defaults elsewhere.
    pub fn with_max_concurrency(max_concurrency: usize) -> Self {
        Self {
            max_concurrency,
            ..Self::default()
        }
    }

    /// Rejects `max_concurrency = 0` and malformed weighted parameters.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.max_concurrency == 0 {
            return Err(PoolError::invalid_argument("max_concurrency must be >= 1"));
        }
        self.weighted.validate()
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Lifecycle phase a freshly built pool starts in.
    #[inline]
    pub fn initial_phase(&self) -> PoolPhase {
        if self.auto_start {
            PoolPhase::Active
        } else {
            PoolPhase::Paused
        }
    }
}

impl Default for PoolConfig {
    /// Default configuration:
    ///
    /// - `max_concurrency = 5`
    /// - `auto_start = true`
    /// - `enable_metrics = true`
    /// - `bus_capacity = 1024`
    /// - `weighted = WeightedConfig::default()`
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            auto_start: true,
            enable_metrics: true,
            bus_capacity: 1024,
            weighted: WeightedConfig::default(),
            grace: Duration::from_secs(5),
        }
    }
}

/// Maps a drain timeout to an `Option`: `0s` → `None` (wait forever).
#[inline]
pub(crate) fn wait_limit(timeout: Duration) -> Option<Duration> {
    if timeout.is_zero() { None } else { Some(timeout) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = PoolConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_concurrency, 5);
        assert_eq!(cfg.initial_phase(), PoolPhase::Active);
        assert_eq!(cfg.grace, Duration::from_secs(5));
    }

    #[test]
    fn unbounded_concurrency_is_accepted() {
        assert!(PoolConfig::with_max_concurrency(usize::MAX).validate().is_ok());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = PoolConfig::with_max_concurrency(0).validate().unwrap_err();
        assert!(matches!(err, PoolError::InvalidArgument { .. }));
    }

    #[test]
    fn sentinels() {
        let cfg = PoolConfig {
            bus_capacity: 0,
            auto_start: false,
            ..PoolConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.initial_phase(), PoolPhase::Paused);
        assert_eq!(wait_limit(Duration::ZERO), None);
        assert_eq!(wait_limit(Duration::from_millis(5)), Some(Duration::from_millis(5)));
    }
}
