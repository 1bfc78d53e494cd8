//! Planning horizon.

use crate::error::{ModelError, Result};
use crate::time::Duration;
use crate::windows::Window;

/// The bounded stretch of the timeline a solve is allowed to place
/// activities in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanningHorizon {
    start: Duration,
    end: Duration,
}

impl PlanningHorizon {
    /// Creates a horizon, rejecting an inverted start/end pair.
    pub fn new(start: Duration, end: Duration) -> Result<PlanningHorizon> {
        if start > end {
            return Err(ModelError::InvalidHorizon { start, end });
        }
        Ok(PlanningHorizon { start, end })
    }

    #[inline]
    pub const fn start(&self) -> Duration {
        self.start
    }

    #[inline]
    pub const fn end(&self) -> Duration {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end.minus(self.start)
    }

    pub fn contains(&self, instant: Duration) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// The horizon as a single window.
    pub fn span(&self) -> Window {
        Window::between(self.start, self.end).expect("horizon start <= end is checked at construction")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_bounds() {
        let err = PlanningHorizon::new(Duration::of_hours(2), Duration::of_hours(1)).unwrap_err();
        assert!(matches!(err, ModelError::InvalidHorizon { .. }));
    }

    #[test]
    fn containment_is_inclusive() {
        let h = PlanningHorizon::new(Duration::ZERO, Duration::of_hours(1)).unwrap();
        assert!(h.contains(Duration::ZERO));
        assert!(h.contains(Duration::of_hours(1)));
        assert!(!h.contains(Duration::of_hours(1).succ()));
    }
}
