//! Error types for the solver.

use thiserror::Error;

use skyplan_core::ModelError;
use skyplan_goals::GoalError;
use skyplan_sim::SimulationError;

/// Main error type for solver operations.
#[derive(Debug, Error)]
pub enum SolveError {
    /// Plan initialization failed; this is the only no-plan outcome.
    #[error("plan initialization failed: {0}")]
    PlanInitialization(String),

    /// A core model operation failed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A goal could not be evaluated.
    #[error(transparent)]
    Goal(#[from] GoalError),

    /// The simulation facade failed outside a rejectable candidate check.
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// Result type alias for solver operations.
pub type Result<T> = std::result::Result<T, SolveError>;
