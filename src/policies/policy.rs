//! # Scheduling policy contract and factory.
//!
//! A [`SchedulingPolicy`] is a comparator over [`TaskMeta`]: `Less` means the
//! first record should be admitted before the second. The pool never hands a
//! policy to a library sort; it picks the top-ranked record with
//! [`select_next`], a linear scan that is equivalent to "sort, take head" for
//! total orders and stays panic-free for comparators with an ε-equality band.
//!
//! ## Factory
//! Names are looked up case-insensitively in a static table:
//! ```text
//! "fifo" ─► Fifo    "lpt" ─► Lpt    "spt" ─► Spt
//! "priority" ─► Priority    "weighted" ─► Weighted(WeightedConfig)
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use tokio::time::Instant;

use crate::error::PoolError;
use crate::policies::{Fifo, Lpt, Priority, Spt, Weighted, WeightedConfig};
use crate::tasks::{TaskId, TaskMeta};

/// Ordering over pending records.
///
/// Implementations must be cheap and side-effect free; the pool calls
/// `compare` while holding its state lock. A panicking implementation aborts
/// the current scheduling pass (reported as `SchedulerError`) and nothing else.
///
/// # Example
/// ```
/// use std::cmp::Ordering;
/// use tokio::time::Instant;
/// use taskpool::{SchedulingPolicy, TaskMeta, by_submission};
///
/// /// Admits the alphabetically smallest name first.
/// struct ByName;
///
/// impl SchedulingPolicy for ByName {
///     fn name(&self) -> &str { "BY_NAME" }
///
///     fn compare(&self, a: &TaskMeta, b: &TaskMeta, _now: Instant) -> Ordering {
///         a.name.cmp(&b.name).then_with(|| by_submission(a, b))
///     }
/// }
/// ```
pub trait SchedulingPolicy: Send + Sync + 'static {
    /// Display name (upper-case for the built-in policies).
    fn name(&self) -> &str;

    /// `Less` if `a` should be admitted before `b`.
    ///
    /// `now` is the instant the scheduling pass started; use it for wait-time based ranking.
    fn compare(&self, a: &TaskMeta, b: &TaskMeta, now: Instant) -> Ordering;
}

/// Shared policy handle.
pub type PolicyRef = Arc<dyn SchedulingPolicy>;

/// Submission-order tie-break: `created_at` ascending, then `id` ascending.
///
/// Every built-in policy ends with this so equal-rank records are admitted in submission order.
#[inline]
pub fn by_submission(a: &TaskMeta, b: &TaskMeta) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Returns the index of the top-ranked record, or `None` for an empty input.
pub fn select_next<'a, I>(policy: &dyn SchedulingPolicy, pending: I, now: Instant) -> Option<usize>
where
    I: IntoIterator<Item = &'a TaskMeta>,
{
    let mut best: Option<(usize, &TaskMeta)> = None;
    for (idx, meta) in pending.into_iter().enumerate() {
        match best {
            Some((_, top)) if policy.compare(meta, top, now) != Ordering::Less => {}
            _ => best = Some((idx, meta)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Returns the admission order the policy would produce for `pending` at `now`.
///
/// Built by repeated [`select_next`], so it matches what successive scheduling passes do.
pub fn rank(policy: &dyn SchedulingPolicy, pending: &[&TaskMeta], now: Instant) -> Vec<TaskId> {
    let mut rest: Vec<&TaskMeta> = pending.to_vec();
    let mut order = Vec::with_capacity(rest.len());
    while let Some(idx) = select_next(policy, rest.iter().copied(), now) {
        order.push(rest.remove(idx).id);
    }
    order
}

/// How the pool obtains its policy: by name through the factory, or as an instance.
#[derive(Clone)]
pub enum PolicySpec {
    /// Resolved with [`from_name`] at build time.
    Named(String),
    /// Used as-is.
    Instance(PolicyRef),
}

impl PolicySpec {
    /// Resolves the name or instance into a policy handle.
    pub fn resolve(self, weighted: &WeightedConfig) -> Result<PolicyRef, PoolError> {
        match self {
            PolicySpec::Named(name) => from_name(&name, weighted),
            PolicySpec::Instance(policy) => Ok(policy),
        }
    }
}

impl fmt::Debug for PolicySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicySpec::Named(name) => f.debug_tuple("Named").field(name).finish(),
            PolicySpec::Instance(p) => f.debug_tuple("Instance").field(&p.name()).finish(),
        }
    }
}

impl Default for PolicySpec {
    /// `FIFO`.
    fn default() -> Self {
        PolicySpec::Named("FIFO".to_string())
    }
}

impl From<&str> for PolicySpec {
    fn from(name: &str) -> Self {
        PolicySpec::Named(name.to_string())
    }
}

impl From<String> for PolicySpec {
    fn from(name: String) -> Self {
        PolicySpec::Named(name)
    }
}

impl From<PolicyRef> for PolicySpec {
    fn from(policy: PolicyRef) -> Self {
        PolicySpec::Instance(policy)
    }
}

type Constructor = fn(&WeightedConfig) -> PolicyRef;

/// Policy table: canonical name → constructor.
const POLICIES: &[(&str, Constructor)] = &[
    ("FIFO", fifo),
    ("LPT", lpt),
    ("SPT", spt),
    ("PRIORITY", priority),
    ("WEIGHTED", weighted),
];

fn fifo(_: &WeightedConfig) -> PolicyRef {
    Arc::new(Fifo)
}

fn lpt(_: &WeightedConfig) -> PolicyRef {
    Arc::new(Lpt)
}

fn spt(_: &WeightedConfig) -> PolicyRef {
    Arc::new(Spt)
}

fn priority(_: &WeightedConfig) -> PolicyRef {
    Arc::new(Priority)
}

fn weighted(cfg: &WeightedConfig) -> PolicyRef {
    Arc::new(Weighted::new(*cfg))
}

/// Creates a built-in policy by name (case-insensitive, otherwise exact).
///
/// `weighted` parameterizes the `WEIGHTED` policy and is ignored by the others.
///
/// # Example
/// ```
/// use taskpool::{WeightedConfig, from_name};
///
/// let lpt = from_name("lpt", &WeightedConfig::default()).unwrap();
/// assert_eq!(lpt.name(), "LPT");
///
/// let err = from_name("round-robin", &WeightedConfig::default()).err().unwrap();
/// assert_eq!(err.as_label(), "pool_unknown_policy");
/// ```
pub fn from_name(name: &str, weighted: &WeightedConfig) -> Result<PolicyRef, PoolError> {
    POLICIES
        .iter()
        .find(|(canonical, _)| canonical.eq_ignore_ascii_case(name))
        .map(|(_, build)| build(weighted))
        .ok_or_else(|| PoolError::UnknownPolicy {
            name: name.to_string(),
            available: available_policies(),
        })
}

/// Canonical names of the built-in policies.
pub fn available_policies() -> Vec<&'static str> {
    POLICIES.iter().map(|(name, _)| *name).collect()
}
