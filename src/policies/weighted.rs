//! # Weighted policy: blend priority, expected duration and waiting time.
//!
//! ```text
//! score = priority_weight · priority / priority_scale
//!       + duration_weight · expected_duration / duration_scale
//!       + wait_weight     · wait_time / wait_scale
//! ```
//!
//! Higher score is admitted first. Scores closer than `epsilon` are equal and
//! fall through to submission order, which keeps floating noise from
//! reordering otherwise-equal records. The wait term grows while a record sits
//! pending, so low-priority work is eventually admitted.
//!
//! ## Defaults
//! - weights: priority `1.0`, duration `0.5`, wait `0.3`
//! - scales: priority `10`, duration `10s`, wait `60s`
//! - epsilon: `0.01`

use std::cmp::Ordering;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::PoolError;
use crate::policies::{SchedulingPolicy, by_submission};
use crate::tasks::TaskMeta;

/// Parameters of the [`Weighted`] policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedConfig {
    /// Weight of the normalized priority term.
    pub priority_weight: f64,
    /// Weight of the normalized expected-duration term.
    pub duration_weight: f64,
    /// Weight of the normalized wait-time term.
    pub wait_weight: f64,

    /// Priority value that normalizes to `1.0`.
    pub priority_scale: f64,
    /// Expected duration that normalizes to `1.0`.
    pub duration_scale: Duration,
    /// Wait time that normalizes to `1.0`.
    pub wait_scale: Duration,

    /// Scores closer than this are treated as equal.
    pub epsilon: f64,
}

impl Default for WeightedConfig {
    fn default() -> Self {
        Self {
            priority_weight: 1.0,
            duration_weight: 0.5,
            wait_weight: 0.3,
            priority_scale: 10.0,
            duration_scale: Duration::from_secs(10),
            wait_scale: Duration::from_secs(60),
            epsilon: 0.01,
        }
    }
}

impl WeightedConfig {
    /// Checks that weights are finite and scales are positive.
    pub fn validate(&self) -> Result<(), PoolError> {
        let weights = [
            ("priority_weight", self.priority_weight),
            ("duration_weight", self.duration_weight),
            ("wait_weight", self.wait_weight),
        ];
        if let Some((field, _)) = weights.iter().find(|(_, w)| !w.is_finite()) {
            return Err(PoolError::invalid_argument(format!(
                "weighted.{field} must be finite"
            )));
        }
        if !(self.priority_scale.is_finite() && self.priority_scale > 0.0) {
            return Err(PoolError::invalid_argument(
                "weighted.priority_scale must be positive",
            ));
        }
        if self.duration_scale.is_zero() || self.wait_scale.is_zero() {
            return Err(PoolError::invalid_argument(
                "weighted duration/wait scales must be non-zero",
            ));
        }
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(PoolError::invalid_argument(
                "weighted.epsilon must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

/// Composite-score policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct Weighted {
    cfg: WeightedConfig,
}

impl Weighted {
    /// Creates the policy with the given parameters.
    pub fn new(cfg: WeightedConfig) -> Self {
        Self { cfg }
    }

    /// Score of `meta` at `now`.
    pub fn score(&self, meta: &TaskMeta, now: Instant) -> f64 {
        let cfg = &self.cfg;
        let waited = now.saturating_duration_since(meta.created_at);

        let priority = f64::from(meta.priority) / cfg.priority_scale;
        let duration = meta.expected_duration.as_secs_f64() / cfg.duration_scale.as_secs_f64();
        let wait = waited.as_secs_f64() / cfg.wait_scale.as_secs_f64();

        cfg.priority_weight * priority + cfg.duration_weight * duration + cfg.wait_weight * wait
    }
}

impl SchedulingPolicy for Weighted {
    fn name(&self) -> &str {
        "WEIGHTED"
    }

    fn compare(&self, a: &TaskMeta, b: &TaskMeta, now: Instant) -> Ordering {
        let diff = self.score(b, now) - self.score(a, now);
        if diff.abs() > self.cfg.epsilon {
            // Finite weights and positive scales keep `diff` out of NaN.
            if diff > 0.0 {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        } else {
            by_submission(a, b)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::rank;

    fn meta(priority: i32, expected_ms: u64) -> TaskMeta {
        TaskMeta::new(None, priority, Duration::from_millis(expected_ms))
    }

    #[tokio::test(start_paused = true)]
    async fn default_score_matches_formula() {
        let policy = Weighted::default();
        let m = meta(5, 2_000);
        tokio::time::advance(Duration::from_secs(30)).await;

        // 1.0·0.5 + 0.5·0.2 + 0.3·0.5
        let score = policy.score(&m, Instant::now());
        assert!((score - 0.75).abs() < 1e-9, "score={score}");
    }

    #[tokio::test(start_paused = true)]
    async fn priority_dominates_with_default_weights() {
        let low = meta(1, 0);
        let high = meta(9, 0);
        assert_eq!(
            rank(&Weighted::default(), &[&low, &high], Instant::now()),
            vec![high.id, low.id]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn near_equal_scores_fall_back_to_submission_order() {
        // 1ms of expected duration is worth 0.00005, far inside epsilon.
        let first = meta(0, 0);
        let second = meta(0, 1);
        assert_eq!(
            rank(&Weighted::default(), &[&second, &first], Instant::now()),
            vec![first.id, second.id]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_lifts_old_low_priority_work() {
        let policy = Weighted::new(WeightedConfig {
            wait_weight: 1.0,
            ..WeightedConfig::default()
        });
        let old = meta(0, 0);
        tokio::time::advance(Duration::from_secs(120)).await;
        let fresh = meta(1, 0);

        // old: 1.0·2.0 = 2.0, fresh: 1.0·0.1 = 0.1
        assert_eq!(
            rank(&policy, &[&fresh, &old], Instant::now()),
            vec![old.id, fresh.id]
        );
    }

    #[test]
    fn validate_rejects_bad_parameters() {
        let nan = WeightedConfig {
            duration_weight: f64::NAN,
            ..WeightedConfig::default()
        };
        assert_eq!(nan.validate().unwrap_err().as_label(), "pool_invalid_argument");

        let zero_scale = WeightedConfig {
            wait_scale: Duration::ZERO,
            ..WeightedConfig::default()
        };
        assert!(zero_scale.validate().is_err());
        assert!(WeightedConfig::default().validate().is_ok());
    }
}
