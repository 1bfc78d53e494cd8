//! Plan-wide global constraints.
//!
//! Global constraints are invariants independent of any single goal: mutual
//! exclusion between activity types and cardinality caps. Each offers two
//! operations: a pass/fail audit of an existing plan, and a window-narrowing
//! helper answering "where could one more activity of this type go without
//! breaking me".

use std::sync::Arc;

use crate::error::{ModelError, Result};
use crate::plan::Plan;
use crate::windows::{TimeWindows, Window};
use crate::ActivityType;

/// The verdict of a global-constraint audit.
#[derive(Debug, Clone)]
pub struct ConstraintState {
    violated: bool,
    violation_windows: TimeWindows,
    explanation: Option<String>,
}

impl ConstraintState {
    pub fn satisfied() -> ConstraintState {
        ConstraintState { violated: false, violation_windows: TimeWindows::new(), explanation: None }
    }

    pub fn violated(windows: TimeWindows, explanation: impl Into<String>) -> ConstraintState {
        ConstraintState {
            violated: true,
            violation_windows: windows,
            explanation: Some(explanation.into()),
        }
    }

    pub fn is_violated(&self) -> bool {
        self.violated
    }

    pub fn violation_windows(&self) -> &TimeWindows {
        &self.violation_windows
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }
}

/// A plan-wide invariant.
#[derive(Debug, Clone)]
pub enum GlobalConstraint {
    /// Activities of the two types must never overlap in time.
    BinaryMutex { a: Arc<ActivityType>, b: Arc<ActivityType> },
    /// No two activities of any of the listed types may overlap.
    NAryMutex { types: Vec<Arc<ActivityType>> },
    /// At most `max` activities of the type may overlap the scope window.
    Cardinality { activity_type: Arc<ActivityType>, scope: Window, max: usize },
}

impl GlobalConstraint {
    pub fn binary_mutex(a: Arc<ActivityType>, b: Arc<ActivityType>) -> GlobalConstraint {
        GlobalConstraint::BinaryMutex { a, b }
    }

    pub fn nary_mutex(types: Vec<Arc<ActivityType>>) -> Result<GlobalConstraint> {
        if types.len() < 2 {
            return Err(ModelError::MutexRequiresTwoTypes);
        }
        Ok(GlobalConstraint::NAryMutex { types })
    }

    pub fn at_most(
        activity_type: Arc<ActivityType>,
        scope: Window,
        max: usize,
    ) -> GlobalConstraint {
        GlobalConstraint::Cardinality { activity_type, scope, max }
    }

    /// Audits the plan: a non-incremental pass/fail check over the given
    /// windows.
    pub fn is_enforced(&self, plan: &Plan, windows: &TimeWindows) -> ConstraintState {
        match self {
            GlobalConstraint::BinaryMutex { a, b } => {
                let overlap = mutex_overlap(plan, &[a.clone(), b.clone()], windows);
                if overlap.is_empty() {
                    ConstraintState::satisfied()
                } else {
                    ConstraintState::violated(
                        overlap,
                        format!("activities of types {} and {} overlap", a.name(), b.name()),
                    )
                }
            }
            GlobalConstraint::NAryMutex { types } => {
                let overlap = mutex_overlap(plan, types, windows);
                if overlap.is_empty() {
                    ConstraintState::satisfied()
                } else {
                    let names: Vec<&str> = types.iter().map(|t| t.name()).collect();
                    ConstraintState::violated(
                        overlap,
                        format!("mutually exclusive types {} overlap", names.join(", ")),
                    )
                }
            }
            GlobalConstraint::Cardinality { activity_type, scope, max } => {
                let count = plan.count_of_type_overlapping(activity_type.name(), scope);
                if count <= *max {
                    ConstraintState::satisfied()
                } else {
                    let mut violation = TimeWindows::of(*scope);
                    violation.intersection(windows, false);
                    ConstraintState::violated(
                        violation,
                        format!(
                            "{count} activities of type {} overlap {scope}, at most {max} allowed",
                            activity_type.name()
                        ),
                    )
                }
            }
        }
    }

    /// The subset of `windows` where inserting one more activity of
    /// `candidate` cannot violate this constraint.
    ///
    /// Mutexes subtract the spans already occupied by the other type(s); a
    /// cardinality cap passes the windows through while the occupancy count
    /// is below the cap and returns the empty set once it is reached.
    pub fn find_windows(
        &self,
        plan: &Plan,
        windows: &TimeWindows,
        candidate: &ActivityType,
    ) -> TimeWindows {
        match self {
            GlobalConstraint::BinaryMutex { a, b } => {
                if **a == *candidate {
                    subtract_occupancy(plan, b.name(), windows)
                } else if **b == *candidate {
                    subtract_occupancy(plan, a.name(), windows)
                } else {
                    windows.clone()
                }
            }
            GlobalConstraint::NAryMutex { types } => {
                if types.iter().any(|t| **t == *candidate) {
                    let mut remaining = windows.clone();
                    for other in types.iter().filter(|t| ***t != *candidate) {
                        remaining = subtract_occupancy(plan, other.name(), &remaining);
                        if remaining.is_empty() {
                            break;
                        }
                    }
                    remaining
                } else {
                    windows.clone()
                }
            }
            GlobalConstraint::Cardinality { activity_type, scope, max } => {
                if **activity_type == *candidate {
                    let count = plan.count_of_type_overlapping(activity_type.name(), scope);
                    if count < *max {
                        windows.clone()
                    } else {
                        TimeWindows::new()
                    }
                } else {
                    windows.clone()
                }
            }
        }
    }
}

fn subtract_occupancy(plan: &Plan, type_name: &str, windows: &TimeWindows) -> TimeWindows {
    let occupied = plan.occupancy_of_type(type_name);
    let mut remaining = windows.clone();
    if !occupied.is_empty() {
        remaining.subtract(&occupied);
    }
    remaining
}

fn mutex_overlap(plan: &Plan, types: &[Arc<ActivityType>], windows: &TimeWindows) -> TimeWindows {
    let mut overlap = TimeWindows::new();
    for (i, left) in types.iter().enumerate() {
        let left_occ = plan.occupancy_of_type(left.name());
        if left_occ.is_empty() {
            continue;
        }
        for right in &types[i + 1..] {
            let mut pairwise = left_occ.clone();
            pairwise.intersection(&plan.occupancy_of_type(right.name()), true);
            overlap.union_all(&pairwise);
        }
    }
    overlap.intersection(windows, true);
    overlap
}
