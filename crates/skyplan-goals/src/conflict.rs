//! Plan conflicts.
//!
//! A conflict is one concrete way a plan dissatisfies a goal, together with
//! the temporal context in which the dissatisfaction holds and whatever the
//! solver needs to repair it: a fully-specified desired instance, a creation
//! template plus the window it should start in, or existing activities that
//! merely lack a credit to the goal.

use skyplan_core::{ActivityCreationTemplate, ActivityInstance, TimeWindows, Window};

/// One dissatisfaction instance of a goal against a plan.
#[derive(Debug, Clone)]
pub enum Conflict {
    /// A concrete desired activity is absent from the plan.
    MissingActivityInstance {
        goal: String,
        instance: ActivityInstance,
        windows: TimeWindows,
    },
    /// No activity matching a template exists in the required window.
    MissingActivityTemplate {
        goal: String,
        template: ActivityCreationTemplate,
        windows: TimeWindows,
    },
    /// Matching activities exist but none is credited to the goal yet.
    MissingAssociation {
        goal: String,
        candidates: Vec<String>,
        windows: TimeWindows,
    },
    /// The dissatisfaction cannot be repaired by adding activities.
    Unsatisfiable {
        goal: String,
        windows: TimeWindows,
        reason: String,
    },
}

impl Conflict {
    /// Builds a missing-instance conflict, anchoring its temporal context at
    /// the desired instance's start when known.
    pub fn missing_instance(goal: impl Into<String>, instance: ActivityInstance) -> Conflict {
        let windows = match instance.start_time() {
            Some(start) => TimeWindows::of(Window::at(start)),
            None => TimeWindows::new(),
        };
        Conflict::MissingActivityInstance { goal: goal.into(), instance, windows }
    }

    /// The name of the goal this conflict belongs to.
    pub fn goal_name(&self) -> &str {
        match self {
            Conflict::MissingActivityInstance { goal, .. }
            | Conflict::MissingActivityTemplate { goal, .. }
            | Conflict::MissingAssociation { goal, .. }
            | Conflict::Unsatisfiable { goal, .. } => goal,
        }
    }

    /// The window(s) in which the dissatisfaction holds.
    pub fn temporal_context(&self) -> &TimeWindows {
        match self {
            Conflict::MissingActivityInstance { windows, .. }
            | Conflict::MissingActivityTemplate { windows, .. }
            | Conflict::MissingAssociation { windows, .. }
            | Conflict::Unsatisfiable { windows, .. } => windows,
        }
    }

    /// Whether the solver can repair this conflict by creating activities.
    pub fn is_repairable(&self) -> bool {
        !matches!(self, Conflict::Unsatisfiable { .. })
    }
}
