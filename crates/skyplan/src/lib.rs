//! skyplan - goal-directed activity scheduling for mission planning
//!
//! Given a mission behavior model, a planning horizon, a set of weighted
//! goals and a set of plan-wide constraints, skyplan produces a plan (a set
//! of time-placed activity instances) that best satisfies the goals without
//! violating the constraints, validating timing and resource effects through
//! an embedded incremental simulation.
//!
//! The pieces, bottom up:
//! - [`TimeWindows`]: the disjoint-interval algebra everything trades in
//! - [`ActivityCreationTemplate`] and friends: matching and creating
//!   activity instances
//! - [`StateConstraintExpression`] and [`GlobalConstraint`]: where things
//!   are allowed to go
//! - [`Goal`] and [`Conflict`]: what the plan should look like and how it
//!   falls short
//! - [`SimulationFacade`]: what actually happens when an activity runs
//! - [`PrioritySolver`]: the single-shot greedy scheduler on top
//!
//! # Examples
//!
//! Window algebra, the common currency:
//!
//! ```
//! use skyplan::{Duration, TimeWindows, Window};
//!
//! let mut available = TimeWindows::of(
//!     Window::between(Duration::ZERO, Duration::of_hours(2)).unwrap(),
//! );
//! let busy = TimeWindows::of(
//!     Window::between(Duration::of_minutes(30), Duration::of_minutes(45)).unwrap(),
//! );
//! available.subtract(&busy);
//! assert_eq!(available.len(), 2);
//! assert_eq!(available.minimum(), Some(Duration::ZERO));
//! ```

pub use skyplan_core::{
    ActivityCreationTemplate, ActivityCreationTemplateBuilder, ActivityCreationTemplateDisjunction,
    ActivityExpression, ActivityExpressionBuilder, ActivityInstance, ActivityType, ConstraintState,
    Duration, ExternalState, GlobalConstraint, ModelError, Parameter, Plan, PlanningHorizon,
    StateComparison, StateConstraintExpression, StateConstraintExpressionBuilder, TimeAnchor,
    TimeRangeExpression, TimeRangeExpressionBuilder, TimeWindows, Validity, ValidityCache, Value,
    ValueKind, ValuePredicate, Window,
};

pub use skyplan_config::{ConfigError, SchedulerConfig};

pub use skyplan_goals::{
    CardinalityGoalBuilder, CoexistenceGoalBuilder, CompositeAndGoalBuilder, Conflict, Evaluation,
    Goal, GoalError, GoalEvaluation, GoalKind, OptionGoalBuilder, Optimizer, ProceduralGoalBuilder,
    Problem, RecurrenceGoalBuilder,
};

pub use skyplan_sim::{
    EngineError, IncrementalDriver, SerializedActivity, SerializedValue, SimResource,
    SimulationEngine, SimulationError, SimulationFacade,
};

pub use skyplan_solver::{PrioritySolver, Solution, SolveError};
