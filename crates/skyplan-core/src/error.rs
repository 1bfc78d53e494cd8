//! Error types for the core scheduling model.

use thiserror::Error;

use crate::time::Duration;
use crate::value::ValueKind;

/// Main error type for model construction and evaluation.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A window was constructed with an inverted min/max.
    #[error("invalid window: start {start} is after end {end}")]
    InvalidWindow { start: Duration, end: Duration },

    /// A planning horizon was constructed with an inverted start/end.
    #[error("invalid planning horizon: start {start} is after end {end}")]
    InvalidHorizon { start: Duration, end: Duration },

    /// An activity was given a negative duration.
    #[error("activity {activity} has negative duration {duration}")]
    NegativeDuration { activity: String, duration: Duration },

    /// Two plan activities share a name.
    #[error("an activity named {0} already exists in the plan")]
    DuplicateActivity(String),

    /// An activity was inserted into a plan without a start time.
    #[error("activity {0} has no start time")]
    MissingStartTime(String),

    /// A plan operation referenced an activity the plan does not hold.
    #[error("no activity named {0} in the plan")]
    UnknownActivity(String),

    /// A template or expression builder was finished without an activity type.
    #[error("activity template requires an activity type")]
    MissingActivityType,

    /// Activity creation needs at least two of start, end and duration windows.
    #[error("activity creation requires at least two of start, end and duration windows")]
    TemplateUnderspecified,

    /// The temporal specifiers of a creation template contradict each other.
    #[error("inconsistent temporal specifiers: {0}")]
    InconsistentTemplate(String),

    /// A name criterion failed to compile as a regular expression.
    #[error("invalid name pattern: {0}")]
    NamePattern(#[from] regex::Error),

    /// A deferred state-query parameter could not be anchored to a time.
    #[error("state query for parameter {parameter} could not be resolved to a single time")]
    UnresolvedQueryTime { parameter: String },

    /// A deferred state-query parameter sampled a state with no value.
    #[error("state query for parameter {parameter} has no value at {time}")]
    UnresolvedQueryValue { parameter: String, time: Duration },

    /// Two values of different kinds were compared.
    #[error("cannot compare a {found} value against a {expected} value")]
    ValueTypeMismatch { expected: ValueKind, found: ValueKind },

    /// A resource was queried before any simulation populated it.
    #[error("resource {0} has no simulated history yet")]
    UninitializedResource(String),

    /// A constraint builder was finished without any member constraint.
    #[error("state constraint builder requires at least one member")]
    EmptyConstraintSet,

    /// A constraint builder was switched between and/or modes.
    #[error("state constraint builder combination mode is already set")]
    BuilderModeAlreadySet,

    /// A constraint builder collected several members without a mode.
    #[error("state constraint builder with several members requires an and/or mode")]
    MissingBuilderMode,

    /// A template disjunction was constructed without any member template.
    #[error("template disjunction requires at least one template")]
    EmptyDisjunction,

    /// A time range expression was finished without a window source.
    #[error("time range expression requires a window source")]
    MissingRangeSource,

    /// An n-ary mutex was constructed with fewer than two types.
    #[error("n-ary mutex requires at least two activity types")]
    MutexRequiresTwoTypes,
}

/// Result type alias for core model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
