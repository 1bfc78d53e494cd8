//! The priority-ordered greedy solver.
//!
//! A single-shot scheduler: goals are processed strictly in their problem
//! order, each one driven to a fixed point of conflict repair before the
//! next is looked at. There is no backtracking across goals: every goal
//! sees a plan reflecting all prior goals' committed contributions, and a
//! goal that cannot accept partial satisfaction has its own contributions
//! rolled back wholesale.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use skyplan_config::SchedulerConfig;
use skyplan_core::{
    ActivityCreationTemplateBuilder, ActivityInstance, ActivityType, Plan, TimeWindows, Window,
};
use skyplan_goals::{Conflict, Evaluation, Goal, GoalKind, Optimizer, Problem};
use skyplan_sim::SimulationFacade;

use crate::error::{Result, SolveError};

/// The outcome of a successful solve: the constructed plan and the per-goal
/// evaluation records output consumers read.
#[derive(Debug)]
pub struct Solution {
    pub plan: Plan,
    pub evaluation: Evaluation,
}

/// Single-shot priority-ordered greedy solver.
///
/// The solver is expended after one solution request; all subsequent
/// requests return no solution.
#[derive(Debug)]
pub struct PrioritySolver {
    config: SchedulerConfig,
    problem: Arc<Problem>,
    facade: SimulationFacade,
    next_instance_id: usize,
    consumed: bool,
}

impl PrioritySolver {
    /// Creates a solver for the given problem. The problem must not change
    /// for the solver's lifetime.
    pub fn new(config: SchedulerConfig, problem: Problem, facade: SimulationFacade) -> PrioritySolver {
        PrioritySolver {
            config,
            problem: Arc::new(problem),
            facade,
            next_instance_id: 0,
            consumed: false,
        }
    }

    /// Calculates the single-shot greedy solution to the input problem.
    ///
    /// The first call builds the initial plan from the problem's seed,
    /// satisfies the goals in priority order and returns the plan with its
    /// evaluation; every later call returns `None`.
    ///
    /// # Errors
    ///
    /// Fails only if plan initialization itself fails, e.g. a seed
    /// activity that cannot be inserted or simulated.
    pub fn get_next_solution(&mut self) -> Result<Option<Solution>> {
        if self.consumed {
            return Ok(None);
        }
        self.consumed = true;

        let mut plan = self.initialize_plan()?;
        let mut evaluation = Evaluation::new();
        self.solve(&mut plan, &mut evaluation)?;
        Ok(Some(Solution { plan, evaluation }))
    }

    fn initialize_plan(&mut self) -> Result<Plan> {
        let mut plan = Plan::new();
        let horizon = *self.problem.horizon();

        for act in self.problem.initial_plan() {
            match act.start_time() {
                Some(start) if horizon.contains(start) => {
                    plan.insert(act.clone())
                        .map_err(|err| SolveError::PlanInitialization(err.to_string()))?;
                }
                _ => {
                    debug!(activity = act.name(), "seed activity outside horizon, skipped");
                }
            }
        }

        if self.config.check_simulation && !plan.is_empty() {
            let seeds: Vec<&ActivityInstance> = plan.activities_by_time();
            self.facade
                .simulate_activities(&seeds)
                .map_err(|err| SolveError::PlanInitialization(err.to_string()))?;
        }

        debug!(seeded = plan.len(), "plan initialized");
        Ok(plan)
    }

    /// Satisfies the problem's goals in priority order, which is their
    /// position in the goal list. Goals are processed independently.
    fn solve(&mut self, plan: &mut Plan, evaluation: &mut Evaluation) -> Result<()> {
        let problem = Arc::clone(&self.problem);
        info!(goals = problem.goals().len(), "starting solve");

        for goal in problem.goals() {
            debug!(goal = goal.name(), "satisfying goal");
            self.satisfy_goal(goal, plan, evaluation)?;
            debug!(
                goal = goal.name(),
                score = evaluation.for_goal(goal.name()).score(),
                "goal finished"
            );
        }

        info!(activities = plan.len(), "solve finished");
        Ok(())
    }

    fn satisfy_goal(
        &mut self,
        goal: &Goal,
        plan: &mut Plan,
        evaluation: &mut Evaluation,
    ) -> Result<()> {
        match goal.kind() {
            GoalKind::And { subgoals } => self.satisfy_composite(goal, subgoals, plan, evaluation),
            GoalKind::OneOf { subgoals, optimizer } => {
                self.satisfy_option(goal, subgoals, *optimizer, plan, evaluation)
            }
            _ => self.satisfy_goal_general(goal, plan, evaluation),
        }
    }

    /// The general fixed-point loop: compute conflicts, repair what can be
    /// repaired, recompute, until no conflict remains or no progress is
    /// made.
    fn satisfy_goal_general(
        &mut self,
        goal: &Goal,
        plan: &mut Plan,
        evaluation: &mut Evaluation,
    ) -> Result<()> {
        let horizon = *self.problem.horizon();
        self.refresh_results()?;

        let mut conflicts = goal.get_conflicts(plan, &horizon, evaluation)?;
        let mut progress = true;
        while !conflicts.is_empty() && progress {
            progress = false;

            for conflict in &conflicts {
                match conflict {
                    Conflict::MissingActivityInstance { .. }
                    | Conflict::MissingActivityTemplate { .. } => {
                        let acts = self.best_new_activities(goal, conflict, plan)?;
                        if !acts.is_empty() && self.check_and_insert(&acts, plan)? {
                            progress = true;
                            let record = evaluation.for_goal(goal.name());
                            for act in &acts {
                                record.add_created(act.name());
                            }
                        }
                    }
                    Conflict::MissingAssociation { candidates, .. } => {
                        let free = candidates
                            .iter()
                            .find(|name| !evaluation.is_claimed_by_other(goal.name(), name));
                        if let Some(name) = free {
                            evaluation.for_goal(goal.name()).add_associated(name);
                            progress = true;
                        }
                    }
                    Conflict::Unsatisfiable { reason, .. } => {
                        debug!(goal = goal.name(), reason, "unrepairable conflict");
                    }
                }
            }

            if progress {
                self.refresh_results()?;
                conflicts = goal.get_conflicts(plan, &horizon, evaluation)?;
            }
        }

        let remaining = conflicts.len() as i64;
        if remaining > 0 && !goal.is_partially_satisfiable() {
            warn!(goal = goal.name(), remaining, "goal unsatisfied, rolling back");
            self.rollback_goal(goal.name(), plan, evaluation)?;
        }
        evaluation.for_goal(goal.name()).set_score(-remaining);
        Ok(())
    }

    /// Satisfied only if every subgoal resolves cleanly; otherwise all
    /// subgoal contributions are rolled back atomically.
    fn satisfy_composite(
        &mut self,
        goal: &Goal,
        subgoals: &[Goal],
        plan: &mut Plan,
        evaluation: &mut Evaluation,
    ) -> Result<()> {
        let mut failed = false;
        for subgoal in subgoals {
            self.satisfy_goal(subgoal, plan, evaluation)?;
            let score = evaluation.for_goal(subgoal.name()).score();
            if score != 0 && !subgoal.is_partially_satisfiable() {
                failed = true;
                break;
            }
        }

        if failed {
            for subgoal in subgoals {
                self.rollback_goal(subgoal.name(), plan, evaluation)?;
            }
            let unsatisfied = subgoals
                .iter()
                .filter(|s| evaluation.goal(s.name()).map_or(true, |e| e.score() != 0))
                .count();
            evaluation.for_goal(goal.name()).set_score(-(unsatisfied as i64));
        } else {
            evaluation.for_goal(goal.name()).set_score(0);
        }
        Ok(())
    }

    /// Satisfied if one subgoal is. Without an optimizer the first
    /// satisfied subgoal wins; with one, every subgoal is tried, undone,
    /// and the best-scoring candidate is re-applied.
    fn satisfy_option(
        &mut self,
        goal: &Goal,
        subgoals: &[Goal],
        optimizer: Option<Optimizer>,
        plan: &mut Plan,
        evaluation: &mut Evaluation,
    ) -> Result<()> {
        let Some(optimizer) = optimizer else {
            let mut satisfied = false;
            for subgoal in subgoals {
                self.satisfy_goal(subgoal, plan, evaluation)?;
                if evaluation.for_goal(subgoal.name()).score() == 0 {
                    satisfied = true;
                    break;
                }
                self.rollback_goal(subgoal.name(), plan, evaluation)?;
            }
            evaluation.for_goal(goal.name()).set_score(if satisfied { 0 } else { -1 });
            return Ok(());
        };

        let mut best: Option<(usize, Vec<ActivityInstance>, Vec<String>, skyplan_core::Duration)> =
            None;
        let mut trivially_satisfied = false;

        for (index, subgoal) in subgoals.iter().enumerate() {
            self.satisfy_goal(subgoal, plan, evaluation)?;

            let (score, created_names, associated_names) = {
                let record = evaluation.for_goal(subgoal.name());
                (record.score(), record.created().clone(), record.associated().clone())
            };
            if score == 0 {
                if created_names.is_empty() && associated_names.is_empty() {
                    trivially_satisfied = true;
                } else {
                    let created_acts: Vec<ActivityInstance> =
                        created_names.iter().filter_map(|n| plan.get(n).cloned()).collect();
                    let credited: Vec<&ActivityInstance> = created_names
                        .iter()
                        .chain(associated_names.iter())
                        .filter_map(|n| plan.get(n))
                        .collect();
                    if let Some(metric) = optimizer.metric(&credited) {
                        let better =
                            best.as_ref().map_or(true, |(_, _, _, m)| optimizer.prefers(metric, *m));
                        if better {
                            let associated: Vec<String> =
                                associated_names.iter().cloned().collect();
                            best = Some((index, created_acts, associated, metric));
                        }
                    }
                }
            }

            self.rollback_goal(subgoal.name(), plan, evaluation)?;
            evaluation.for_goal(subgoal.name()).set_score(0);
        }

        match best {
            Some((index, created_acts, associated, _metric)) => {
                if self.check_and_insert(&created_acts, plan)? {
                    let winner = subgoals[index].name();
                    let record = evaluation.for_goal(winner);
                    for act in &created_acts {
                        record.add_created(act.name());
                    }
                    for name in &associated {
                        record.add_associated(name);
                    }
                    evaluation.for_goal(goal.name()).set_score(0);
                } else {
                    evaluation.for_goal(goal.name()).set_score(-1);
                }
            }
            None => {
                let score = if trivially_satisfied { 0 } else { -1 };
                evaluation.for_goal(goal.name()).set_score(score);
            }
        }
        Ok(())
    }

    /// Determines the best new activities to repair one conflict: the
    /// conflict's temporal context narrowed by state constraints (goal
    /// level, then activity-type level) and then by the problem's global
    /// constraints; placement takes the earliest remaining instant.
    ///
    /// Both narrowing families are monotonic, so their order only affects
    /// how early an empty set short-circuits the loop.
    fn best_new_activities(
        &mut self,
        goal: &Goal,
        conflict: &Conflict,
        plan: &Plan,
    ) -> Result<Vec<ActivityInstance>> {
        let candidate_type: Arc<ActivityType> = match conflict {
            Conflict::MissingActivityInstance { instance, .. } => instance.activity_type().clone(),
            Conflict::MissingActivityTemplate { template, .. } => match template.activity_type() {
                Some(activity_type) => activity_type.clone(),
                None => return Ok(Vec::new()),
            },
            _ => return Ok(Vec::new()),
        };

        let mut windows: TimeWindows = conflict.temporal_context().clone();
        if let Some(constraints) = goal.state_constraints() {
            windows = constraints.find_windows(plan, &windows)?;
        }
        if !windows.is_empty() {
            if let Some(constraints) = candidate_type.state_constraints() {
                windows = constraints.find_windows(plan, &windows)?;
            }
        }
        for constraint in self.problem.global_constraints() {
            if windows.is_empty() {
                break;
            }
            windows = constraint.find_windows(plan, &windows, &candidate_type);
        }
        if windows.is_empty() {
            debug!(goal = goal.name(), "no valid window remains for conflict");
            return Ok(Vec::new());
        }

        match conflict {
            Conflict::MissingActivityInstance { instance, .. } => {
                // The desired instance is fully specified; narrowing only
                // vetoes it.
                match instance.start_time() {
                    Some(start) if windows.contains(start) => Ok(vec![instance.clone()]),
                    _ => Ok(Vec::new()),
                }
            }
            Conflict::MissingActivityTemplate { template, .. } => {
                let start = match windows.minimum() {
                    Some(start) => start,
                    None => return Ok(Vec::new()),
                };
                let name = format!(
                    "{}_{}_{}",
                    goal.name(),
                    self.config.instance_name_prefix,
                    self.next_instance_id
                );
                self.next_instance_id += 1;

                let complete = ActivityCreationTemplateBuilder::new()
                    .based_on(template)
                    .starts_in(Window::at(start))
                    .build()?;
                match complete.create_activity(name) {
                    Ok(act) => Ok(vec![act]),
                    Err(err) => {
                        warn!(goal = goal.name(), error = %err, "could not instantiate template");
                        Ok(Vec::new())
                    }
                }
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Simulates and inserts a batch of activities. A declared duration
    /// that differs from the simulated one rejects the candidate, and any
    /// rejection rolls the whole batch back out of the plan and the
    /// simulation.
    fn check_and_insert(&mut self, acts: &[ActivityInstance], plan: &mut Plan) -> Result<bool> {
        let horizon_end = self.problem.horizon().end();
        let mut inserted: Vec<String> = Vec::new();
        let mut all_good = true;

        for act in acts {
            let mut act = act.clone();
            // Last chance to bind deferred parameters to concrete values.
            if let Err(err) = act.resolve_parameters() {
                warn!(activity = act.name(), error = %err, "parameters could not be resolved");
                all_good = false;
                break;
            }
            if let (Some(start), Some(duration)) = (act.start_time(), act.duration()) {
                if start.plus(duration) > horizon_end {
                    warn!(
                        activity = act.name(),
                        "activity finishes after the planning horizon, not inserting"
                    );
                    all_good = false;
                    break;
                }
            }

            let name = act.name().to_owned();
            if let Err(err) = plan.insert(act.clone()) {
                warn!(activity = name.as_str(), error = %err, "plan insertion failed");
                all_good = false;
                break;
            }
            inserted.push(name.clone());

            if self.config.check_simulation {
                if let Err(err) = self.facade.simulate_activity(&act) {
                    warn!(activity = name.as_str(), error = %err, "activity could not be simulated");
                    all_good = false;
                    break;
                }
                match self.facade.computed_activity_duration(&name) {
                    Ok(Some(simulated)) => match act.duration() {
                        None => plan.set_duration(&name, simulated)?,
                        Some(declared) if declared != simulated => {
                            warn!(
                                activity = name.as_str(),
                                %declared,
                                %simulated,
                                "simulated duration differs from declared, rejecting"
                            );
                            all_good = false;
                            break;
                        }
                        Some(_) => {}
                    },
                    Ok(None) => {
                        warn!(activity = name.as_str(), "activity did not finish simulating");
                        all_good = false;
                        break;
                    }
                    Err(err) => {
                        warn!(activity = name.as_str(), error = %err, "duration query failed");
                        all_good = false;
                        break;
                    }
                }
            }
        }

        if !all_good {
            plan.remove_all(inserted.iter().map(String::as_str));
            if self.config.check_simulation && !inserted.is_empty() {
                let names: BTreeSet<String> = inserted.into_iter().collect();
                self.facade.remove_activities_from_simulation(&names)?;
            }
            return Ok(false);
        }
        Ok(true)
    }

    /// Removes every activity created for the goal from the plan and the
    /// simulation, and clears the goal's credits.
    fn rollback_goal(
        &mut self,
        goal_name: &str,
        plan: &mut Plan,
        evaluation: &mut Evaluation,
    ) -> Result<()> {
        let created: Vec<String> =
            evaluation.for_goal(goal_name).created().iter().cloned().collect();
        if !created.is_empty() {
            plan.remove_all(created.iter().map(String::as_str));
            if self.config.check_simulation {
                let names: BTreeSet<String> = created.iter().cloned().collect();
                self.facade.remove_activities_from_simulation(&names)?;
            }
            debug!(goal = goal_name, removed = created.len(), "goal contributions rolled back");
        }
        evaluation.for_goal(goal_name).clear_credits();
        Ok(())
    }

    fn refresh_results(&mut self) -> Result<()> {
        if self.config.check_simulation {
            self.facade.get_simulation_results_until(self.problem.horizon().end())?;
        }
        Ok(())
    }
}
