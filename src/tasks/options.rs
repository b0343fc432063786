//! # Per-task submission options.
//!
//! [`TaskOptions`] carries the caller-supplied metadata a record is created with.
//! All fields are immutable once the record exists.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskpool::TaskOptions;
//!
//! let opts = TaskOptions::new()
//!     .with_name("resize-images")
//!     .with_priority(9)
//!     .with_expected_duration(Duration::from_millis(500));
//!
//! assert_eq!(opts.priority, 9);
//! assert_eq!(opts.name.as_deref(), Some("resize-images"));
//! ```

use std::borrow::Cow;
use std::time::Duration;

/// Metadata attached to a work item at submission.
///
/// ## Field semantics
/// - `priority`: higher is more urgent (`0` default); used by `Priority` and `Weighted`
/// - `expected_duration`: cost estimate (`0s` default); used by `LPT`, `SPT` and `Weighted`
/// - `name`: diagnostic label (`None` → `Task_<id>`)
#[derive(Clone, Debug, Default)]
pub struct TaskOptions {
    /// Urgency rank.
    pub priority: i32,
    /// Estimated execution cost.
    pub expected_duration: Duration,
    /// Diagnostic label.
    pub name: Option<Cow<'static, str>>,
}

impl TaskOptions {
    /// Default options: priority 0, no duration estimate, generated name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the priority.
    #[inline]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the expected duration.
    #[inline]
    pub fn with_expected_duration(mut self, expected: Duration) -> Self {
        self.expected_duration = expected;
        self
    }

    /// Sets the diagnostic name.
    #[inline]
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }
}
