//! Adaptive processing period.

use std::time::Duration;

/// Smallest adjustment applied to the period, in either direction.
const STEP: Duration = Duration::from_millis(500);

/// Interval between scheduled ticks, bounded by `[min, max]`.
///
/// Speeds up quickly after successful sends and backs off linearly while
/// they fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessPeriod {
    min: Duration,
    max: Duration,
    current: Duration,
}

impl ProcessPeriod {
    /// Start at `min`. `max` is raised to `min` if smaller.
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
            current: min,
        }
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Shrink by a fifth of the distance to `min`, at least one step.
    pub fn record_success(&mut self) {
        let decrease = ((self.current - self.min) / 5).max(STEP);
        self.current = self.current.saturating_sub(decrease).max(self.min);
    }

    /// Grow by one step.
    pub fn record_failure(&mut self) {
        self.current = (self.current + STEP).min(self.max);
    }

    pub fn reset(&mut self) {
        self.current = self.min;
    }
}
