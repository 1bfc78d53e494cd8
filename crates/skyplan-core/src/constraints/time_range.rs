//! Anchor time-range expressions.
//!
//! Goals anchor themselves to stretches of the timeline: "every orbit",
//! "whenever the battery is charged", "around each downlink". A time range
//! expression produces those stretches from a window source and narrows them
//! through an ordered chain of filters and transformers.

use std::sync::Arc;

use crate::error::{ModelError, Result};
use crate::plan::Plan;
use crate::time::Duration;
use crate::windows::{TimeWindows, Window};
use crate::ActivityExpression;

use super::state::StateConstraintExpression;

/// Where the anchor windows come from.
#[derive(Debug)]
pub enum RangeSource {
    /// The bounds passed to `compute_range`, unchanged.
    Bounds,
    /// An explicit window set.
    Windows(TimeWindows),
    /// The satisfaction windows of a state constraint.
    Constraint(Arc<StateConstraintExpression>),
    /// The occupancy spans of plan activities matching an expression.
    Activities(ActivityExpression),
}

/// One step of the filter/transformer chain.
#[derive(Debug, Clone)]
pub enum RangeTransform {
    /// Drops windows shorter than the given length.
    FilterMinDuration(Duration),
    /// Drops windows longer than the given length.
    FilterMaxDuration(Duration),
    /// Shortens every window at both ends, dropping inverted results.
    ContractBy { front: Duration, back: Duration },
    /// Shifts both endpoints of every window by signed offsets.
    ShiftBy { start: Duration, end: Duration },
    /// Drops the earliest window.
    DropFirst,
    /// Drops the latest window.
    DropLast,
}

/// A window-producing pipeline: source plus transform chain.
#[derive(Debug)]
pub struct TimeRangeExpression {
    source: RangeSource,
    transforms: Vec<RangeTransform>,
}

impl TimeRangeExpression {
    pub fn builder() -> TimeRangeExpressionBuilder {
        TimeRangeExpressionBuilder::default()
    }

    /// An expression producing exactly the bounds it is evaluated over.
    pub fn over_bounds() -> TimeRangeExpression {
        TimeRangeExpression { source: RangeSource::Bounds, transforms: Vec::new() }
    }

    /// Evaluates the pipeline against the given plan, restricted to
    /// `bounds`. The result is always within `bounds`.
    pub fn compute_range(&self, plan: &Plan, bounds: &TimeWindows) -> Result<TimeWindows> {
        let mut windows = match &self.source {
            RangeSource::Bounds => bounds.clone(),
            RangeSource::Windows(set) => {
                let mut set = set.clone();
                set.intersection(bounds, false);
                set
            }
            RangeSource::Constraint(constraint) => constraint.find_windows(plan, bounds)?,
            RangeSource::Activities(expression) => {
                let mut set = TimeWindows::new();
                for act in plan.find(expression)? {
                    if let Some(start) = act.start_time() {
                        let end = act.end_time().unwrap_or(start);
                        set.union(Window::between(start, end)?);
                    }
                }
                set.intersection(bounds, false);
                set
            }
        };

        for transform in &self.transforms {
            match transform {
                RangeTransform::FilterMinDuration(min) => {
                    windows.filter_by_duration(Some(*min), None);
                }
                RangeTransform::FilterMaxDuration(max) => {
                    windows.filter_by_duration(None, Some(*max));
                }
                RangeTransform::ContractBy { front, back } => {
                    windows.contract_by(*front, *back);
                }
                RangeTransform::ShiftBy { start, end } => {
                    let shifted: Vec<Window> =
                        windows.iter().filter_map(|w| w.shifted(*start, *end)).collect();
                    windows = TimeWindows::of_all(shifted);
                    windows.intersection(bounds, false);
                }
                RangeTransform::DropFirst => windows.remove_first(),
                RangeTransform::DropLast => windows.remove_last(),
            }
            if windows.is_empty() {
                break;
            }
        }

        Ok(windows)
    }
}

/// Fluent builder for [`TimeRangeExpression`].
#[derive(Debug, Default)]
pub struct TimeRangeExpressionBuilder {
    source: Option<RangeSource>,
    transforms: Vec<RangeTransform>,
}

impl TimeRangeExpressionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchors on the evaluation bounds themselves.
    pub fn from_bounds(mut self) -> Self {
        self.source = Some(RangeSource::Bounds);
        self
    }

    /// Anchors on an explicit window set.
    pub fn from_windows(mut self, windows: TimeWindows) -> Self {
        self.source = Some(RangeSource::Windows(windows));
        self
    }

    /// Anchors on the satisfaction windows of a state constraint.
    pub fn from_constraint(mut self, constraint: Arc<StateConstraintExpression>) -> Self {
        self.source = Some(RangeSource::Constraint(constraint));
        self
    }

    /// Anchors on the spans of activities matching an expression.
    pub fn from_activities(mut self, expression: ActivityExpression) -> Self {
        self.source = Some(RangeSource::Activities(expression));
        self
    }

    pub fn filter_min_duration(mut self, min: Duration) -> Self {
        self.transforms.push(RangeTransform::FilterMinDuration(min));
        self
    }

    pub fn filter_max_duration(mut self, max: Duration) -> Self {
        self.transforms.push(RangeTransform::FilterMaxDuration(max));
        self
    }

    pub fn contract_by(mut self, front: Duration, back: Duration) -> Self {
        self.transforms.push(RangeTransform::ContractBy { front, back });
        self
    }

    pub fn shift_by(mut self, start: Duration, end: Duration) -> Self {
        self.transforms.push(RangeTransform::ShiftBy { start, end });
        self
    }

    pub fn drop_first(mut self) -> Self {
        self.transforms.push(RangeTransform::DropFirst);
        self
    }

    pub fn drop_last(mut self) -> Self {
        self.transforms.push(RangeTransform::DropLast);
        self
    }

    /// Finishes the builder; a window source is required.
    pub fn build(self) -> Result<TimeRangeExpression> {
        let source = self.source.ok_or(ModelError::MissingRangeSource)?;
        Ok(TimeRangeExpression { source, transforms: self.transforms })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seconds(s: i64) -> Duration {
        Duration::of_seconds(s)
    }

    fn window(a: i64, b: i64) -> Window {
        Window::between(seconds(a), seconds(b)).unwrap()
    }

    #[test]
    fn missing_source_fails_at_build() {
        let err = TimeRangeExpression::builder().build().unwrap_err();
        assert!(matches!(err, ModelError::MissingRangeSource));
    }

    #[test]
    fn explicit_windows_are_clipped_to_bounds() {
        let expr = TimeRangeExpression::builder()
            .from_windows(TimeWindows::of_all([window(0, 10), window(20, 30)]))
            .build()
            .unwrap();
        let plan = Plan::new();
        let bounds = TimeWindows::of(window(5, 25));
        let range = expr.compute_range(&plan, &bounds).unwrap();
        assert_eq!(range, TimeWindows::of_all([window(5, 10), window(20, 25)]));
    }

    #[test]
    fn transform_chain_applies_in_order() {
        let expr = TimeRangeExpression::builder()
            .from_windows(TimeWindows::of_all([window(0, 2), window(10, 30), window(40, 60)]))
            .filter_min_duration(seconds(10))
            .drop_last()
            .contract_by(seconds(1), seconds(1))
            .build()
            .unwrap();
        let plan = Plan::new();
        let range = expr.compute_range(&plan, &TimeWindows::forever()).unwrap();
        assert_eq!(range, TimeWindows::of(window(11, 29)));
    }
}
