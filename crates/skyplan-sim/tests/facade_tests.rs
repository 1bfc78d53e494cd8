//! Facade and driver tests against the mock step engine.

use std::collections::BTreeSet;
use std::sync::Arc;

use skyplan_core::{
    ActivityInstance, ActivityType, Duration, ExternalState, PlanningHorizon, TimeWindows, Value,
    Window,
};
use skyplan_test::{StepEngine, TypeBehavior};

use skyplan_sim::SimulationFacade;

fn seconds(s: i64) -> Duration {
    Duration::of_seconds(s)
}

fn observation() -> Arc<ActivityType> {
    Arc::new(ActivityType::new("Observation"))
}

fn facade_with_load() -> SimulationFacade {
    let engine = StepEngine::new()
        .with_resource("load", Value::Int(0))
        .with_activity("Observation", TypeBehavior::from_argument().adding("load", 1));
    let horizon = PlanningHorizon::new(Duration::ZERO, seconds(100)).unwrap();
    SimulationFacade::new(horizon, Box::new(engine))
}

fn act(name: &str, start: i64, duration: i64) -> ActivityInstance {
    ActivityInstance::spanning(name, observation(), seconds(start), seconds(duration)).unwrap()
}

#[test]
fn unscheduled_activities_are_rejected() {
    let mut facade = facade_with_load();
    let loose = ActivityInstance::new("loose", observation());
    let err = facade.simulate_activity(&loose).unwrap_err();
    assert!(matches!(err, skyplan_sim::SimulationError::UnscheduledActivity(_)));
}

#[test]
fn duration_is_absent_until_the_activity_finishes() {
    let mut facade = facade_with_load();
    facade.simulate_activity(&act("a", 10, 5)).unwrap();
    // The engine has only stepped to the activity's start.
    assert_eq!(facade.get_activity_duration("a"), None);
    assert_eq!(facade.computed_activity_duration("a").unwrap(), Some(seconds(5)));
}

#[test]
fn in_order_insertions_do_not_replay() {
    let mut facade = facade_with_load();
    facade.simulate_activity(&act("a", 10, 5)).unwrap();
    facade.simulate_activity(&act("b", 20, 5)).unwrap();
    assert_eq!(facade.inserted_count(), 2);
}

#[test]
fn out_of_order_insertion_restarts_and_replays() {
    let mut facade = facade_with_load();
    facade.simulate_activity(&act("a", 10, 5)).unwrap();
    // Move the engine clock past t=10 so the duration resolves.
    assert_eq!(facade.computed_activity_duration("a").unwrap(), Some(seconds(5)));

    // Inserting behind the watermark must replay, not corrupt history.
    facade.simulate_activity(&act("b", 5, 4)).unwrap();
    facade.get_simulation_results_until(seconds(100)).unwrap();

    let load = facade.get_resource("load");
    // B's effect is visible from t=5, before A ever ran.
    assert_eq!(load.value_at(seconds(6)), Some(Value::Int(1)));
    assert_eq!(load.value_at(seconds(2)), Some(Value::Int(0)));
    // A's span still contributes after the replay.
    assert_eq!(load.value_at(seconds(12)), Some(Value::Int(1)));
    assert_eq!(load.value_at(seconds(20)), Some(Value::Int(0)));
}

#[test]
fn results_are_cached_until_dirty() {
    let mut facade = facade_with_load();
    facade.simulate_activity(&act("a", 10, 5)).unwrap();
    assert!(facade.results_dirty());

    facade.get_simulation_results_until(seconds(50)).unwrap();
    assert!(!facade.results_dirty());

    // Covered horizon, clean results: a no-op.
    facade.get_simulation_results_until(seconds(40)).unwrap();
    assert!(!facade.results_dirty());

    // Any insertion dirties the results again.
    facade.simulate_activity(&act("b", 60, 5)).unwrap();
    assert!(facade.results_dirty());
}

#[test]
fn removal_erases_the_activity_effects() {
    let mut facade = facade_with_load();
    facade.simulate_activity(&act("a", 10, 5)).unwrap();
    facade.get_simulation_results_until(seconds(50)).unwrap();

    let names: BTreeSet<String> = BTreeSet::from(["a".to_owned()]);
    facade.remove_activities_from_simulation(&names).unwrap();
    assert_eq!(facade.inserted_count(), 0);

    facade.get_simulation_results_until(seconds(50)).unwrap();
    let load = facade.get_resource("load");
    assert_eq!(load.value_at(seconds(12)), Some(Value::Int(0)));
}

#[test]
fn overlapping_activities_stack_their_effects() {
    let mut facade = facade_with_load();
    facade.simulate_activity(&act("a", 10, 10)).unwrap();
    facade.simulate_activity(&act("b", 15, 10)).unwrap();
    facade.get_simulation_results_until(seconds(100)).unwrap();

    let load = facade.get_resource("load");
    assert_eq!(load.value_at(seconds(12)), Some(Value::Int(1)));
    assert_eq!(load.value_at(seconds(17)), Some(Value::Int(2)));
    assert_eq!(load.value_at(seconds(22)), Some(Value::Int(1)));
    assert_eq!(load.value_at(seconds(30)), Some(Value::Int(0)));

    let busy = load
        .when_value_above(&Value::Int(0), &TimeWindows::of(Window::between(Duration::ZERO, seconds(100)).unwrap()))
        .unwrap();
    assert!(busy.contains(seconds(12)));
    assert!(!busy.contains(seconds(5)));
}

#[test]
fn fixed_duration_types_ignore_the_declared_duration() {
    let engine = StepEngine::new()
        .with_resource("load", Value::Int(0))
        .with_activity("Calibration", TypeBehavior::fixed(seconds(30)));
    let horizon = PlanningHorizon::new(Duration::ZERO, seconds(100)).unwrap();
    let mut facade = SimulationFacade::new(horizon, Box::new(engine));

    let declared = ActivityInstance::spanning(
        "cal",
        Arc::new(ActivityType::new("Calibration")),
        seconds(0),
        seconds(5),
    )
    .unwrap();
    facade.simulate_activity(&declared).unwrap();
    assert_eq!(facade.computed_activity_duration("cal").unwrap(), Some(seconds(30)));
}
