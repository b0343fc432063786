use std::marker::PhantomData;
use std::sync::Arc;

use crate::core::{ConcurrencyPool, PoolConfig};
use crate::error::PoolError;
use crate::policies::PolicySpec;
use crate::subscribers::Subscribe;

/// Builder for a [`ConcurrencyPool`] with optional policy and subscribers.
///
/// ## Example
/// ```rust
/// use taskpool::{ConcurrencyPool, PoolConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), taskpool::PoolError> {
/// let pool = ConcurrencyPool::<u32>::builder(PoolConfig::with_max_concurrency(2))
///     .with_policy("spt")
///     .build()?;
/// assert_eq!(pool.status().policy_name, "SPT");
/// # Ok(())
/// # }
/// ```
pub struct PoolBuilder<T> {
    cfg: PoolConfig,
    policy: PolicySpec,
    subscribers: Vec<Arc<dyn Subscribe>>,
    _output: PhantomData<fn() -> T>,
}

impl<T: Send + 'static> PoolBuilder<T> {
    /// Creates a new builder with the given configuration and the FIFO policy.
    pub fn new(cfg: PoolConfig) -> Self {
        Self {
            cfg,
            policy: PolicySpec::default(),
            subscribers: Vec::new(),
            _output: PhantomData,
        }
    }

    /// Selects the scheduling policy by name (`"fifo"`, `"lpt"`, ...) or instance.
    pub fn with_policy(mut self, policy: impl Into<PolicySpec>) -> Self {
        self.policy = policy.into();
        self
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive pool events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Validates the configuration, resolves the policy and starts the pool.
    ///
    /// Must be called inside a tokio runtime: it spawns the scheduler loop and,
    /// when subscribers are present, the subscriber listener.
    pub fn build(self) -> Result<ConcurrencyPool<T>, PoolError> {
        self.cfg.validate()?;
        let policy = self.policy.resolve(&self.cfg.weighted)?;
        Ok(ConcurrencyPool::start(self.cfg, policy, self.subscribers))
    }
}
