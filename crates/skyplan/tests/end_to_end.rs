//! Full-pipeline scheduling scenarios through the public API.

use std::sync::Arc;

use skyplan::{
    ActivityCreationTemplate, ActivityInstance, ActivityType, CoexistenceGoalBuilder, Duration,
    Optimizer, OptionGoalBuilder, PlanningHorizon, PrioritySolver, Problem, RecurrenceGoalBuilder,
    SchedulerConfig, SimulationFacade, StateConstraintExpression, TimeRangeExpression, TimeWindows,
    Value, Window,
};
use skyplan_test::{StepEngine, TypeBehavior};

fn seconds(s: i64) -> Duration {
    Duration::of_seconds(s)
}

fn observation() -> Arc<ActivityType> {
    Arc::new(ActivityType::new("Observation"))
}

fn checking_config() -> SchedulerConfig {
    let mut config = SchedulerConfig::new();
    config.check_simulation = true;
    config
}

/// An observation must be placed while the spacecraft is sunlit, which only
/// happens during a seeded sun pass. The goal's state constraint reads the
/// simulated `sunlit` resource and narrows placement into the pass.
#[test]
fn state_constraint_narrows_placement_into_the_sun_pass() {
    let engine = StepEngine::new()
        .with_resource("sunlit", Value::Bool(false))
        .with_activity("SunPass", TypeBehavior::from_argument().setting("sunlit", Value::Bool(true)))
        .with_activity("Observation", TypeBehavior::from_argument());

    let horizon = PlanningHorizon::new(Duration::ZERO, seconds(7200)).unwrap();
    let mut facade = SimulationFacade::new(horizon, Box::new(engine));
    let sunlit = facade.get_resource("sunlit");

    let sun_pass = Arc::new(ActivityType::new("SunPass"));
    let mut problem = Problem::new(horizon);
    problem.add_activity_type(observation());
    problem.add_activity_type(sun_pass.clone());
    problem.set_initial_plan(vec![ActivityInstance::spanning(
        "pass0",
        sun_pass,
        seconds(1800),
        seconds(3600),
    )
    .unwrap()]);

    let in_sunlight =
        Arc::new(StateConstraintExpression::equal(sunlit, Value::Bool(true)));
    problem.add_goal(
        RecurrenceGoalBuilder::new()
            .named("sunlit_obs")
            .there_exists(
                ActivityCreationTemplate::builder()
                    .of_type(observation())
                    .duration(seconds(600))
                    .build()
                    .unwrap(),
            )
            .repeating_every(seconds(7200))
            .attach_state_constraints(in_sunlight)
            .build()
            .unwrap(),
    );

    let mut solver = PrioritySolver::new(checking_config(), problem, facade);
    let solution = solver.get_next_solution().unwrap().unwrap();

    let observations = solution.plan.activities_of_type("Observation");
    assert_eq!(observations.len(), 1);
    // The whole horizon was eligible, but only the sunlit stretch survives
    // the narrowing; placement takes its earliest instant.
    assert_eq!(observations[0].start_time(), Some(seconds(1800)));
    assert_eq!(solution.evaluation.goal("sunlit_obs").unwrap().score(), 0);
}

/// Two viable subgoals; the optimizer keeps only the one whose activity
/// finishes earliest.
#[test]
fn option_goal_optimizer_keeps_the_earliest_finishing_candidate() {
    let engine = StepEngine::new()
        .with_resource("load", Value::Int(0))
        .with_activity("Observation", TypeBehavior::from_argument().adding("load", 1));

    let horizon = PlanningHorizon::new(Duration::ZERO, seconds(7200)).unwrap();
    let facade = SimulationFacade::new(horizon, Box::new(engine));
    let mut problem = Problem::new(horizon);
    problem.add_activity_type(observation());

    let template = ActivityCreationTemplate::builder()
        .of_type(observation())
        .duration(seconds(600))
        .build()
        .unwrap();

    let late_goal = CoexistenceGoalBuilder::new()
        .named("late_obs")
        .for_each(
            TimeRangeExpression::builder()
                .from_windows(TimeWindows::of(
                    Window::between(seconds(3600), seconds(7200)).unwrap(),
                ))
                .build()
                .unwrap(),
        )
        .there_exists(template.clone())
        .build()
        .unwrap();
    let early_goal = CoexistenceGoalBuilder::new()
        .named("early_obs")
        .for_each(
            TimeRangeExpression::builder()
                .from_windows(TimeWindows::of(
                    Window::between(seconds(600), seconds(3000)).unwrap(),
                ))
                .build()
                .unwrap(),
        )
        .there_exists(template)
        .build()
        .unwrap();

    problem.add_goal(
        OptionGoalBuilder::new()
            .named("one_obs")
            .with_subgoal(late_goal)
            .with_subgoal(early_goal)
            .optimized_by(Optimizer::EarliestEndTime)
            .build()
            .unwrap(),
    );

    let mut solver = PrioritySolver::new(checking_config(), problem, facade);
    let solution = solver.get_next_solution().unwrap().unwrap();

    let observations = solution.plan.activities_of_type("Observation");
    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].start_time(), Some(seconds(600)));
    assert_eq!(solution.evaluation.goal("one_obs").unwrap().score(), 0);
}
