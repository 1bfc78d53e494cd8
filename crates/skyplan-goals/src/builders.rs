//! Goal builders.
//!
//! Goals are built fluently and validated at `build()`: a missing template,
//! anchor or subgoal list fails immediately and loudly, never silently
//! defaults.

use std::sync::Arc;

use skyplan_core::{
    ActivityCreationTemplate, ActivityInstance, Duration, Plan, StateConstraintExpression,
    TimeRangeExpression, Window,
};

use crate::error::{GoalError, Result};
use crate::goal::{Generator, Goal, GoalKind, Optimizer};

/// A template-family goal can only repair conflicts if its template can
/// create activities: besides the start the solver picks, it must pin the
/// duration or the end.
fn require_creatable(name: &str, template: &ActivityCreationTemplate) -> Result<()> {
    if template.duration_range().is_none() && template.expression().end_range().is_none() {
        return Err(GoalError::TemplateNotCreatable(name.to_owned()));
    }
    Ok(())
}

macro_rules! common_goal_methods {
    () => {
        /// Names the goal; required.
        pub fn named(mut self, name: impl Into<String>) -> Self {
            self.name = Some(name.into());
            self
        }

        /// Allows the goal to end a solve with unresolved conflicts instead
        /// of rolling its contributions back.
        pub fn partially_satisfiable(mut self) -> Self {
            self.partially_satisfiable = true;
            self
        }

        /// Attaches a state constraint that candidate placements must
        /// satisfy.
        pub fn attach_state_constraints(
            mut self,
            constraints: Arc<StateConstraintExpression>,
        ) -> Self {
            self.state_constraints = Some(constraints);
            self
        }

        /// Restricts the goal to a window of the horizon.
        pub fn within(mut self, context: Window) -> Self {
            self.temporal_context = Some(context);
            self
        }

        fn common_build(&mut self) -> Result<(String, bool, Option<Arc<StateConstraintExpression>>, Option<Window>)> {
            let name = self.name.take().ok_or(GoalError::MissingName)?;
            Ok((
                name,
                self.partially_satisfiable,
                self.state_constraints.take(),
                self.temporal_context.take(),
            ))
        }
    };
}

/// Builder for a recurrence goal: one matching activity per repeat span.
#[derive(Debug, Default)]
pub struct RecurrenceGoalBuilder {
    name: Option<String>,
    partially_satisfiable: bool,
    state_constraints: Option<Arc<StateConstraintExpression>>,
    temporal_context: Option<Window>,
    template: Option<ActivityCreationTemplate>,
    every: Option<Duration>,
}

impl RecurrenceGoalBuilder {
    common_goal_methods!();

    pub fn new() -> Self {
        Self::default()
    }

    /// The activity the goal wants to recur.
    pub fn there_exists(mut self, template: ActivityCreationTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// The repeat interval.
    pub fn repeating_every(mut self, every: Duration) -> Self {
        self.every = Some(every);
        self
    }

    pub fn build(mut self) -> Result<Goal> {
        let (name, partially_satisfiable, state_constraints, temporal_context) =
            self.common_build()?;
        let template = self.template.ok_or_else(|| GoalError::MissingTemplate(name.clone()))?;
        require_creatable(&name, &template)?;
        let every = self
            .every
            .filter(|e| *e > Duration::ZERO)
            .ok_or_else(|| GoalError::InvalidRecurrenceInterval(name.clone()))?;
        Ok(Goal {
            name,
            partially_satisfiable,
            state_constraints,
            temporal_context,
            kind: GoalKind::Recurrence { template, every },
        })
    }
}

/// Builder for a coexistence goal: one matching activity per anchor window.
#[derive(Debug, Default)]
pub struct CoexistenceGoalBuilder {
    name: Option<String>,
    partially_satisfiable: bool,
    state_constraints: Option<Arc<StateConstraintExpression>>,
    temporal_context: Option<Window>,
    template: Option<ActivityCreationTemplate>,
    anchor: Option<TimeRangeExpression>,
}

impl CoexistenceGoalBuilder {
    common_goal_methods!();

    pub fn new() -> Self {
        Self::default()
    }

    /// The anchor windows the goal reacts to.
    pub fn for_each(mut self, anchor: TimeRangeExpression) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// The activity desired in each anchor window.
    pub fn there_exists(mut self, template: ActivityCreationTemplate) -> Self {
        self.template = Some(template);
        self
    }

    pub fn build(mut self) -> Result<Goal> {
        let (name, partially_satisfiable, state_constraints, temporal_context) =
            self.common_build()?;
        let template = self.template.ok_or_else(|| GoalError::MissingTemplate(name.clone()))?;
        require_creatable(&name, &template)?;
        let anchor = self.anchor.ok_or_else(|| GoalError::MissingAnchor(name.clone()))?;
        Ok(Goal {
            name,
            partially_satisfiable,
            state_constraints,
            temporal_context,
            kind: GoalKind::Coexistence { template, anchor },
        })
    }
}

/// Builder for a cardinality goal: bounded count and/or total duration of
/// matching activities within a scope.
#[derive(Debug, Default)]
pub struct CardinalityGoalBuilder {
    name: Option<String>,
    partially_satisfiable: bool,
    state_constraints: Option<Arc<StateConstraintExpression>>,
    temporal_context: Option<Window>,
    template: Option<ActivityCreationTemplate>,
    scope: Option<TimeRangeExpression>,
    occurrences: Option<(usize, usize)>,
    total_duration: Option<Window>,
}

impl CardinalityGoalBuilder {
    common_goal_methods!();

    pub fn new() -> Self {
        Self::default()
    }

    /// The scope the count and duration are measured over.
    pub fn in_period(mut self, scope: TimeRangeExpression) -> Self {
        self.scope = Some(scope);
        self
    }

    /// The activity being counted.
    pub fn there_exists(mut self, template: ActivityCreationTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Bounds on how many matching activities the scope must hold.
    pub fn occurrences(mut self, min: usize, max: usize) -> Self {
        self.occurrences = Some((min, max));
        self
    }

    /// Bounds on the summed duration of matching activities.
    pub fn total_duration(mut self, range: Window) -> Self {
        self.total_duration = Some(range);
        self
    }

    pub fn build(mut self) -> Result<Goal> {
        let (name, partially_satisfiable, state_constraints, temporal_context) =
            self.common_build()?;
        let template = self.template.ok_or_else(|| GoalError::MissingTemplate(name.clone()))?;
        if template.duration_range().is_none() {
            // The greedy fill sizes activities from the template's duration
            // range.
            return Err(GoalError::TemplateNotCreatable(name));
        }
        let scope = self.scope.ok_or_else(|| GoalError::MissingScope(name.clone()))?;
        if self.occurrences.is_none() && self.total_duration.is_none() {
            return Err(GoalError::UnderspecifiedCardinality(name));
        }
        Ok(Goal {
            name,
            partially_satisfiable,
            state_constraints,
            temporal_context,
            kind: GoalKind::Cardinality {
                template,
                scope,
                occurrences: self.occurrences,
                total_duration: self.total_duration,
            },
        })
    }
}

/// Builder for a procedural-creation goal.
#[derive(Default)]
pub struct ProceduralGoalBuilder {
    name: Option<String>,
    partially_satisfiable: bool,
    state_constraints: Option<Arc<StateConstraintExpression>>,
    temporal_context: Option<Window>,
    generator: Option<Generator>,
}

impl ProceduralGoalBuilder {
    common_goal_methods!();

    pub fn new() -> Self {
        Self::default()
    }

    /// The pure function of the plan producing the desired activities.
    pub fn generated_by<F>(mut self, generator: F) -> Self
    where
        F: Fn(&Plan) -> Vec<ActivityInstance> + 'static,
    {
        self.generator = Some(Arc::new(generator));
        self
    }

    pub fn build(mut self) -> Result<Goal> {
        let (name, partially_satisfiable, state_constraints, temporal_context) =
            self.common_build()?;
        let generator = self.generator.ok_or_else(|| GoalError::MissingGenerator(name.clone()))?;
        Ok(Goal {
            name,
            partially_satisfiable,
            state_constraints,
            temporal_context,
            kind: GoalKind::Procedural { generator },
        })
    }
}

/// Builder for a composite AND goal.
#[derive(Debug, Default)]
pub struct CompositeAndGoalBuilder {
    name: Option<String>,
    partially_satisfiable: bool,
    state_constraints: Option<Arc<StateConstraintExpression>>,
    temporal_context: Option<Window>,
    subgoals: Vec<Goal>,
}

impl CompositeAndGoalBuilder {
    common_goal_methods!();

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subgoal(mut self, subgoal: Goal) -> Self {
        self.subgoals.push(subgoal);
        self
    }

    pub fn build(mut self) -> Result<Goal> {
        let (name, partially_satisfiable, state_constraints, temporal_context) =
            self.common_build()?;
        if self.subgoals.is_empty() {
            return Err(GoalError::EmptySubgoals(name));
        }
        Ok(Goal {
            name,
            partially_satisfiable,
            state_constraints,
            temporal_context,
            kind: GoalKind::And { subgoals: self.subgoals },
        })
    }
}

/// Builder for an option goal: exactly one subgoal must be satisfied.
///
/// Only exactly-one selection is implemented; asking for any other range
/// fails at `build()`.
#[derive(Debug, Default)]
pub struct OptionGoalBuilder {
    name: Option<String>,
    partially_satisfiable: bool,
    state_constraints: Option<Arc<StateConstraintExpression>>,
    temporal_context: Option<Window>,
    subgoals: Vec<Goal>,
    optimizer: Option<Optimizer>,
    selection: Option<(usize, usize)>,
}

impl OptionGoalBuilder {
    common_goal_methods!();

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subgoal(mut self, subgoal: Goal) -> Self {
        self.subgoals.push(subgoal);
        self
    }

    /// Picks the best satisfied subgoal by the given policy instead of the
    /// first.
    pub fn optimized_by(mut self, optimizer: Optimizer) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    /// Requests a number of subgoals to satisfy. Anything but `(1, 1)` is
    /// rejected at build time.
    pub fn selecting(mut self, min: usize, max: usize) -> Self {
        self.selection = Some((min, max));
        self
    }

    pub fn build(mut self) -> Result<Goal> {
        let (name, partially_satisfiable, state_constraints, temporal_context) =
            self.common_build()?;
        if self.subgoals.is_empty() {
            return Err(GoalError::EmptySubgoals(name));
        }
        if let Some(selection) = self.selection {
            if selection != (1, 1) {
                return Err(GoalError::UnsupportedSelection(name));
            }
        }
        Ok(Goal {
            name,
            partially_satisfiable,
            state_constraints,
            temporal_context,
            kind: GoalKind::OneOf { subgoals: self.subgoals, optimizer: self.optimizer },
        })
    }
}
