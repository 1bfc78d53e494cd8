//! skyplan-core - Core model for the skyplan activity scheduler
//!
//! This crate provides the foundations everything else is built on:
//! - Fixed-point time arithmetic and the disjoint interval algebra
//! - The activity model: types, instances, matching expressions, creation
//!   templates
//! - The plan workspace and planning horizon
//! - State and global constraints with their validity cache

pub mod activity;
pub mod constraints;
pub mod error;
pub mod horizon;
pub mod plan;
pub mod states;
pub mod time;
pub mod value;
pub mod windows;

#[cfg(test)]
mod windows_tests;

pub use activity::{
    ActivityCreationTemplate, ActivityCreationTemplateBuilder, ActivityCreationTemplateDisjunction,
    ActivityExpression, ActivityExpressionBuilder, ActivityInstance, ActivityType,
};
pub use constraints::{
    ConstraintState, GlobalConstraint, StateComparison, StateConstraintExpression,
    StateConstraintExpressionBuilder, TimeRangeExpression, TimeRangeExpressionBuilder, Validity,
    ValidityCache, ValuePredicate,
};
pub use error::{ModelError, Result};
pub use horizon::PlanningHorizon;
pub use plan::Plan;
pub use states::ExternalState;
pub use time::Duration;
pub use value::{Parameter, TimeAnchor, Value, ValueKind};
pub use windows::{TimeWindows, Window};
