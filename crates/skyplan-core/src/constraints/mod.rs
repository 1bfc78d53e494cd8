//! Constraint layer: state constraints with their validity cache, anchor
//! time-range expressions, and plan-wide global constraints.

mod cache;
mod global;
mod state;
mod time_range;

pub use cache::{Validity, ValidityCache};
pub use global::{ConstraintState, GlobalConstraint};
pub use state::{
    StateComparison, StateConstraintExpression, StateConstraintExpressionBuilder, ValuePredicate,
};
pub use time_range::{RangeSource, RangeTransform, TimeRangeExpression, TimeRangeExpressionBuilder};
