//! # Key-based policies: FIFO, LPT, SPT, Priority.
//!
//! | Policy     | Primary key                   | Tie-break                 |
//! |------------|-------------------------------|---------------------------|
//! | [`Fifo`]     | `created_at` ascending        | `id` ascending            |
//! | [`Lpt`]      | `expected_duration` descending| submission order          |
//! | [`Spt`]      | `expected_duration` ascending | submission order          |
//! | [`Priority`] | `priority` descending         | submission order          |

use std::cmp::Ordering;

use tokio::time::Instant;

use crate::policies::{SchedulingPolicy, by_submission};
use crate::tasks::TaskMeta;

/// First in, first out.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fifo;

impl SchedulingPolicy for Fifo {
    fn name(&self) -> &str {
        "FIFO"
    }

    fn compare(&self, a: &TaskMeta, b: &TaskMeta, _now: Instant) -> Ordering {
        by_submission(a, b)
    }
}

/// Longest processing time first.
#[derive(Clone, Copy, Debug, Default)]
pub struct Lpt;

impl SchedulingPolicy for Lpt {
    fn name(&self) -> &str {
        "LPT"
    }

    fn compare(&self, a: &TaskMeta, b: &TaskMeta, _now: Instant) -> Ordering {
        b.expected_duration
            .cmp(&a.expected_duration)
            .then_with(|| by_submission(a, b))
    }
}

/// Shortest processing time first.
#[derive(Clone, Copy, Debug, Default)]
pub struct Spt;

impl SchedulingPolicy for Spt {
    fn name(&self) -> &str {
        "SPT"
    }

    fn compare(&self, a: &TaskMeta, b: &TaskMeta, _now: Instant) -> Ordering {
        a.expected_duration
            .cmp(&b.expected_duration)
            .then_with(|| by_submission(a, b))
    }
}

/// Highest priority first.
#[derive(Clone, Copy, Debug, Default)]
pub struct Priority;

impl SchedulingPolicy for Priority {
    fn name(&self) -> &str {
        "PRIORITY"
    }

    fn compare(&self, a: &TaskMeta, b: &TaskMeta, _now: Instant) -> Ordering {
        b.priority
            .cmp(&a.priority)
            .then_with(|| by_submission(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::rank;
    use std::time::Duration;

    fn meta(priority: i32, expected_ms: u64) -> TaskMeta {
        TaskMeta::new(None, priority, Duration::from_millis(expected_ms))
    }

    #[test]
    fn fifo_ignores_priority_and_duration() {
        let a = meta(1, 900);
        let b = meta(9, 10);
        assert_eq!(rank(&Fifo, &[&b, &a], Instant::now()), vec![a.id, b.id]);
    }

    #[test]
    fn spt_orders_shortest_first() {
        let a = meta(0, 100);
        let b = meta(0, 500);
        let c = meta(0, 50);
        assert_eq!(
            rank(&Spt, &[&a, &b, &c], Instant::now()),
            vec![c.id, a.id, b.id]
        );
    }

    #[test]
    fn priority_prefers_higher_regardless_of_submission() {
        let x = meta(1, 0);
        let y = meta(9, 0);
        assert_eq!(rank(&Priority, &[&x, &y], Instant::now()), vec![y.id, x.id]);
    }

    #[test]
    fn priority_handles_negative_values() {
        let low = meta(-5, 0);
        let zero = meta(0, 0);
        assert_eq!(
            Priority.compare(&zero, &low, Instant::now()),
            Ordering::Less
        );
    }
}
