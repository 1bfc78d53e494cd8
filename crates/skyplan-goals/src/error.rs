//! Error types for goal construction and evaluation.

use thiserror::Error;

use skyplan_core::ModelError;

/// Main error type for goal building and conflict computation.
#[derive(Debug, Error)]
pub enum GoalError {
    /// A goal builder was finished without a name.
    #[error("goal requires a name")]
    MissingName,

    /// A goal builder was finished without its activity template.
    #[error("goal {0} requires an activity template")]
    MissingTemplate(String),

    /// A goal template cannot create activities (no duration or end window).
    #[error("goal {0}: template must carry a duration or end window to create activities")]
    TemplateNotCreatable(String),

    /// A recurrence goal was built without a positive repeat interval.
    #[error("goal {0} requires a positive recurrence interval")]
    InvalidRecurrenceInterval(String),

    /// A coexistence goal was built without an anchor range expression.
    #[error("goal {0} requires an anchor time range")]
    MissingAnchor(String),

    /// A cardinality goal was built without a scope range expression.
    #[error("goal {0} requires a scope time range")]
    MissingScope(String),

    /// A cardinality goal was built without an occurrence or duration bound.
    #[error("goal {0} requires an occurrence range or a total duration range")]
    UnderspecifiedCardinality(String),

    /// A procedural goal was built without a generator function.
    #[error("goal {0} requires a generator function")]
    MissingGenerator(String),

    /// A composite goal was built without subgoals.
    #[error("goal {0} requires at least one subgoal")]
    EmptySubgoals(String),

    /// An option goal was asked for anything but exactly-one selection.
    #[error("goal {0}: only exactly-one subgoal selection is implemented")]
    UnsupportedSelection(String),

    /// A core model operation failed during conflict computation.
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result type alias for goal operations.
pub type Result<T> = std::result::Result<T, GoalError>;
