//! skyplan-goals - Goal and conflict model for the skyplan scheduler
//!
//! This crate describes what a plan *should* look like and how it falls
//! short:
//! - [`Goal`] variants: recurrence, coexistence, cardinality, procedural
//!   creation, composite-AND and option goals
//! - [`Conflict`]: one concrete dissatisfaction and what would repair it
//! - [`Evaluation`]: per-goal scores and credited activities of a solve
//! - [`Problem`]: the immutable input of one solve

pub mod builders;
pub mod conflict;
pub mod error;
pub mod evaluation;
pub mod goal;
pub mod problem;


pub use builders::{
    CardinalityGoalBuilder, CoexistenceGoalBuilder, CompositeAndGoalBuilder, OptionGoalBuilder,
    ProceduralGoalBuilder, RecurrenceGoalBuilder,
};
pub use conflict::Conflict;
pub use error::{GoalError, Result};
pub use evaluation::{Evaluation, GoalEvaluation};
pub use goal::{Generator, Goal, GoalKind, Optimizer};
pub use problem::Problem;
