//! Error types for the simulation facade.

use thiserror::Error;

use skyplan_core::{Duration, ModelError};

/// Errors raised by the external simulation engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine does not know the requested activity type.
    #[error("unknown activity type: {0}")]
    UnknownActivityType(String),

    /// The activity's arguments could not be validated or applied.
    #[error("invalid arguments for activity {activity}: {reason}")]
    InvalidArguments { activity: String, reason: String },

    /// An activity was scheduled behind the engine's event clock.
    #[error("cannot schedule {name} at {start}: simulation clock is already at {clock}")]
    StartInPast { name: String, start: Duration, clock: Duration },

    /// The engine failed internally.
    #[error("engine failure: {0}")]
    Internal(String),
}

/// Main error type for facade operations.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The engine rejected or failed an operation.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// An activity without a start time was handed to the simulation.
    #[error("activity {0} has no start time to simulate at")]
    UnscheduledActivity(String),

    /// A deferred parameter could not be resolved before serialization.
    #[error("activity {activity}: parameter {parameter} could not be resolved")]
    UnresolvedParameter { activity: String, parameter: String },

    /// A sample from the engine did not fit the resource's declared kind.
    #[error("resource {resource}: sample at {time} does not deserialize as {kind}")]
    MalformedSample { resource: String, time: Duration, kind: String },

    /// A core model operation failed while preparing the simulation.
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result type alias for simulation facade operations.
pub type Result<T> = std::result::Result<T, SimulationError>;
