//! Goal model.
//!
//! A goal is a declarative, named description of a desired plan property.
//! Evaluating a goal against a plan produces zero or more [`Conflict`]s; it
//! never mutates the plan. Priority is not stored on the goal; it is the
//! goal's position in the problem's goal list.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use skyplan_core::{
    ActivityCreationTemplate, ActivityExpressionBuilder, ActivityInstance,
    ActivityCreationTemplateBuilder, Duration, Plan, PlanningHorizon, StateConstraintExpression,
    TimeRangeExpression, TimeWindows, Window,
};

use crate::conflict::Conflict;
use crate::error::{GoalError, Result};
use crate::evaluation::Evaluation;

/// Policy for picking the best satisfied subgoal of an option goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Optimizer {
    /// Prefer the candidate whose activities finish earliest.
    EarliestEndTime,
    /// Prefer the candidate whose activities begin latest.
    LatestStartTime,
}

impl Optimizer {
    /// The comparison metric of a candidate activity set: the completion
    /// time for [`EarliestEndTime`](Self::EarliestEndTime), the earliest
    /// start for [`LatestStartTime`](Self::LatestStartTime). `None` when no
    /// activity carries the needed times.
    pub fn metric(&self, acts: &[&ActivityInstance]) -> Option<Duration> {
        match self {
            Optimizer::EarliestEndTime => acts.iter().filter_map(|a| a.end_time()).max(),
            Optimizer::LatestStartTime => acts.iter().filter_map(|a| a.start_time()).min(),
        }
    }

    /// Whether a candidate metric beats the incumbent one.
    pub fn prefers(&self, candidate: Duration, incumbent: Duration) -> bool {
        match self {
            Optimizer::EarliestEndTime => candidate < incumbent,
            Optimizer::LatestStartTime => candidate > incumbent,
        }
    }
}

/// The generator function of a procedural goal: a pure function of the plan
/// producing the activities it wants to exist.
pub type Generator = Arc<dyn Fn(&Plan) -> Vec<ActivityInstance>>;

/// The variant-specific payload of a goal.
pub enum GoalKind {
    /// One matching activity per `every`-sized span of the goal's context.
    Recurrence { template: ActivityCreationTemplate, every: Duration },
    /// One matching activity per anchor window.
    Coexistence { template: ActivityCreationTemplate, anchor: TimeRangeExpression },
    /// Bounded count and/or total duration of matching activities in a
    /// scope.
    Cardinality {
        template: ActivityCreationTemplate,
        scope: TimeRangeExpression,
        occurrences: Option<(usize, usize)>,
        total_duration: Option<Window>,
    },
    /// Desired activities produced by an external pure function of the
    /// plan.
    Procedural { generator: Generator },
    /// Satisfied only if every subgoal is.
    And { subgoals: Vec<Goal> },
    /// Satisfied if exactly one subgoal is; an optimizer may pick the best
    /// satisfied one rather than the first.
    OneOf { subgoals: Vec<Goal>, optimizer: Option<Optimizer> },
}

impl fmt::Debug for GoalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalKind::Recurrence { template, every } => f
                .debug_struct("Recurrence")
                .field("template", template)
                .field("every", every)
                .finish(),
            GoalKind::Coexistence { template, anchor } => f
                .debug_struct("Coexistence")
                .field("template", template)
                .field("anchor", anchor)
                .finish(),
            GoalKind::Cardinality { template, occurrences, total_duration, .. } => f
                .debug_struct("Cardinality")
                .field("template", template)
                .field("occurrences", occurrences)
                .field("total_duration", total_duration)
                .finish(),
            GoalKind::Procedural { .. } => f.debug_struct("Procedural").finish_non_exhaustive(),
            GoalKind::And { subgoals } => {
                f.debug_struct("And").field("subgoals", subgoals).finish()
            }
            GoalKind::OneOf { subgoals, optimizer } => f
                .debug_struct("OneOf")
                .field("subgoals", subgoals)
                .field("optimizer", optimizer)
                .finish(),
        }
    }
}

/// A named desired plan property.
#[derive(Debug)]
pub struct Goal {
    pub(crate) name: String,
    pub(crate) partially_satisfiable: bool,
    pub(crate) state_constraints: Option<Arc<StateConstraintExpression>>,
    pub(crate) temporal_context: Option<Window>,
    pub(crate) kind: GoalKind,
}

impl Goal {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a leftover negative score is acceptable, or the solver must
    /// roll this goal's contributions back.
    pub fn is_partially_satisfiable(&self) -> bool {
        self.partially_satisfiable
    }

    pub fn state_constraints(&self) -> Option<&Arc<StateConstraintExpression>> {
        self.state_constraints.as_ref()
    }

    pub fn kind(&self) -> &GoalKind {
        &self.kind
    }

    /// The window this goal cares about: its declared context, or the whole
    /// horizon.
    pub fn context_window(&self, horizon: &PlanningHorizon) -> Window {
        self.temporal_context.unwrap_or_else(|| horizon.span())
    }

    /// The creation template of a template-family goal, if it has one.
    pub fn template(&self) -> Option<&ActivityCreationTemplate> {
        match &self.kind {
            GoalKind::Recurrence { template, .. }
            | GoalKind::Coexistence { template, .. }
            | GoalKind::Cardinality { template, .. } => Some(template),
            _ => None,
        }
    }

    /// Computes this goal's conflicts against the plan.
    ///
    /// A pure function of the plan and the running evaluation (which only
    /// matters for association claims); the plan is never mutated.
    pub fn get_conflicts(
        &self,
        plan: &Plan,
        horizon: &PlanningHorizon,
        evaluation: &Evaluation,
    ) -> Result<Vec<Conflict>> {
        match &self.kind {
            GoalKind::Recurrence { template, every } => {
                self.recurrence_conflicts(plan, horizon, template, *every)
            }
            GoalKind::Coexistence { template, anchor } => {
                self.coexistence_conflicts(plan, horizon, template, anchor)
            }
            GoalKind::Cardinality { template, scope, occurrences, total_duration } => self
                .cardinality_conflicts(plan, horizon, template, scope, *occurrences, *total_duration),
            GoalKind::Procedural { generator } => {
                self.procedural_conflicts(plan, evaluation, generator)
            }
            GoalKind::And { subgoals } | GoalKind::OneOf { subgoals, .. } => {
                let mut conflicts = Vec::new();
                for subgoal in subgoals {
                    conflicts.extend(subgoal.get_conflicts(plan, horizon, evaluation)?);
                }
                Ok(conflicts)
            }
        }
    }

    fn recurrence_conflicts(
        &self,
        plan: &Plan,
        horizon: &PlanningHorizon,
        template: &ActivityCreationTemplate,
        every: Duration,
    ) -> Result<Vec<Conflict>> {
        let context = self.context_window(horizon);
        let mut conflicts = Vec::new();

        let mut span_start = context.start();
        while span_start < context.end() {
            let span_end = span_start.plus(every).min(context.end());
            let span = Window::between(span_start, span_end)?;
            let matcher = ActivityExpressionBuilder::new()
                .based_on(template.expression())
                .starts_in(span)
                .build()?;
            if plan.find(&matcher)?.is_empty() {
                conflicts.push(Conflict::MissingActivityTemplate {
                    goal: self.name.clone(),
                    template: template.clone(),
                    windows: TimeWindows::of(span),
                });
            }
            span_start = span_end;
        }
        Ok(conflicts)
    }

    fn coexistence_conflicts(
        &self,
        plan: &Plan,
        horizon: &PlanningHorizon,
        template: &ActivityCreationTemplate,
        anchor: &TimeRangeExpression,
    ) -> Result<Vec<Conflict>> {
        let bounds = TimeWindows::of(self.context_window(horizon));
        let anchors = anchor.compute_range(plan, &bounds)?;

        let mut conflicts = Vec::new();
        for window in anchors.iter() {
            let matcher = ActivityExpressionBuilder::new()
                .based_on(template.expression())
                .starts_in(window)
                .build()?;
            if plan.find(&matcher)?.is_empty() {
                conflicts.push(Conflict::MissingActivityTemplate {
                    goal: self.name.clone(),
                    template: template.clone(),
                    windows: TimeWindows::of(window),
                });
            }
        }
        Ok(conflicts)
    }

    fn cardinality_conflicts(
        &self,
        plan: &Plan,
        horizon: &PlanningHorizon,
        template: &ActivityCreationTemplate,
        scope: &TimeRangeExpression,
        occurrences: Option<(usize, usize)>,
        total_duration: Option<Window>,
    ) -> Result<Vec<Conflict>> {
        let bounds = TimeWindows::of(self.context_window(horizon));
        let scope_windows = scope.compute_range(plan, &bounds)?;
        if scope_windows.is_empty() {
            return Ok(Vec::new());
        }

        let matcher = ActivityExpressionBuilder::new()
            .based_on(template.expression())
            .starts_or_ends_in_windows(scope_windows.clone())
            .build()?;
        let mut acts = plan.find(&matcher)?;
        acts.sort_by_key(|a| a.start_time());
        let existing = acts.len();
        let total = acts
            .iter()
            .fold(Duration::ZERO, |acc, a| acc.plus(a.duration().unwrap_or(Duration::ZERO)));

        let mut dur_to_schedule = Duration::ZERO;
        let mut nb_to_schedule = 0usize;

        if let Some(range) = total_duration {
            if total < range.start() {
                dur_to_schedule = range.start().minus(total);
            } else if total > range.end() {
                debug!(goal = self.name.as_str(), %total, "duration excess is unrepairable");
                // Shedding duration would mean deleting activities, which
                // the solver never does.
                return Ok(vec![Conflict::Unsatisfiable {
                    goal: self.name.clone(),
                    windows: scope_windows,
                    reason: format!(
                        "total duration {total} of {existing} matching activities exceeds \
                         the allowed maximum {}",
                        range.end()
                    ),
                }]);
            }
        }
        if let Some((min, max)) = occurrences {
            if existing < min {
                nb_to_schedule = min - existing;
            } else if existing > max {
                debug!(goal = self.name.as_str(), existing, max, "occurrence excess is unrepairable");
                return Ok(vec![Conflict::Unsatisfiable {
                    goal: self.name.clone(),
                    windows: scope_windows,
                    reason: format!("{existing} matching activities exceed the allowed maximum {max}"),
                }]);
            }
        }
        if nb_to_schedule == 0 && dur_to_schedule.is_zero() {
            return Ok(Vec::new());
        }

        let mut range = scope_windows;
        if let Some(constraints) =
            template.activity_type().and_then(|t| t.state_constraints())
        {
            range = constraints.find_windows(plan, &range)?;
        }
        if let Some(constraints) = &self.state_constraints {
            range = constraints.find_windows(plan, &range)?;
        }

        let duration_range = template
            .duration_range()
            .copied()
            .ok_or_else(|| GoalError::TemplateNotCreatable(self.name.clone()))?;
        let created = plan_cardinality_fill(
            &self.name,
            template,
            &range,
            duration_range,
            nb_to_schedule,
            dur_to_schedule,
            existing,
        )?;

        Ok(created.into_iter().map(|act| Conflict::missing_instance(self.name.clone(), act)).collect())
    }

    fn procedural_conflicts(
        &self,
        plan: &Plan,
        evaluation: &Evaluation,
        generator: &Generator,
    ) -> Result<Vec<Conflict>> {
        let desired = generator(plan);
        let mut conflicts = Vec::new();

        for wanted in desired {
            let found = plan.iter().find(|act| act.matches_in_properties(&wanted));
            match found {
                Some(existing) => {
                    if evaluation.is_credited_to(&self.name, existing.name()) {
                        continue;
                    }
                    if evaluation.is_claimed_by_other(&self.name, existing.name()) {
                        // The match belongs to another goal; this one needs
                        // its own copy.
                        conflicts.push(Conflict::missing_instance(self.name.clone(), wanted));
                    } else {
                        let windows = match existing.start_time() {
                            Some(start) => {
                                let end = existing.end_time().unwrap_or(start);
                                TimeWindows::of(Window::between(start, end)?)
                            }
                            None => TimeWindows::new(),
                        };
                        conflicts.push(Conflict::MissingAssociation {
                            goal: self.name.clone(),
                            candidates: vec![existing.name().to_owned()],
                            windows,
                        });
                    }
                }
                None => conflicts.push(Conflict::missing_instance(self.name.clone(), wanted)),
            }
        }
        Ok(conflicts)
    }
}

/// Greedy placement for a cardinality deficit: first the minimum count of
/// shortest activities packed from each window's start, then extension of
/// the last activity per window, then largest-fitting activities until the
/// duration need is met or room runs out.
fn plan_cardinality_fill(
    goal_name: &str,
    template: &ActivityCreationTemplate,
    range: &TimeWindows,
    duration_range: Window,
    nb_to_schedule: usize,
    dur_to_schedule: Duration,
    name_offset: usize,
) -> Result<Vec<ActivityInstance>> {
    let min_dur = duration_range.start();
    let max_dur = duration_range.end();
    let windows: Vec<Window> = range.iter().collect();
    let mut cursors: Vec<Duration> = windows.iter().map(|w| w.start()).collect();
    let mut last_in_window: Vec<Option<usize>> = vec![None; windows.len()];
    let mut created: Vec<ActivityInstance> = Vec::new();
    let mut scheduled_dur = Duration::ZERO;

    let mut make = |start: Duration, dur: Duration, created: &mut Vec<ActivityInstance>| -> Result<usize> {
        let name = format!("{goal_name}_{}", name_offset + created.len());
        let act = ActivityCreationTemplateBuilder::new()
            .based_on(template)
            .starts_in(Window::at(start))
            .duration(dur)
            .build()?
            .create_activity(name)?;
        created.push(act);
        Ok(created.len() - 1)
    };

    // Minimum-duration activities until the occurrence need is met.
    'windows: for (i, window) in windows.iter().enumerate() {
        while created.len() < nb_to_schedule {
            if window.end().minus(cursors[i]) < min_dur {
                continue 'windows;
            }
            let idx = make(cursors[i], min_dur, &mut created)?;
            last_in_window[i] = Some(idx);
            cursors[i] = cursors[i].plus(min_dur);
            scheduled_dur = scheduled_dur.plus(min_dur);
        }
        break;
    }

    // Extend the last activity of each window toward the duration need.
    if scheduled_dur < dur_to_schedule {
        for (i, window) in windows.iter().enumerate() {
            let Some(idx) = last_in_window[i] else { continue };
            let act = &mut created[idx];
            let (Some(end), Some(dur)) = (act.end_time(), act.duration()) else { continue };
            if end < window.end() && dur < max_dur {
                let increase = window.end().minus(end).min(max_dur.minus(dur));
                act.set_duration(dur.plus(increase))?;
                cursors[i] = cursors[i].plus(increase);
                scheduled_dur = scheduled_dur.plus(increase);
            }
            if scheduled_dur >= dur_to_schedule {
                break;
            }
        }
    }

    // Fill remaining duration with the largest activities that fit.
    if scheduled_dur < dur_to_schedule {
        'fill: for (i, window) in windows.iter().enumerate() {
            loop {
                if scheduled_dur >= dur_to_schedule {
                    break 'fill;
                }
                let room = window.end().minus(cursors[i]);
                if room < min_dur {
                    break;
                }
                let dur = max_dur.min(room);
                let idx = make(cursors[i], dur, &mut created)?;
                last_in_window[i] = Some(idx);
                cursors[i] = cursors[i].plus(dur);
                scheduled_dur = scheduled_dur.plus(dur);
            }
        }
    }

    Ok(created)
}
