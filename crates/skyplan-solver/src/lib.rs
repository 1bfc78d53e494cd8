//! skyplan-solver - Priority-ordered greedy solving for skyplan
//!
//! [`PrioritySolver`] builds a plan for a [`Problem`](skyplan_goals::Problem)
//! in a single shot: goals in priority order, conflicts repaired greedily
//! through constraint-narrowed windows, candidates validated against the
//! incremental simulation, and per-goal rollback when partial satisfaction
//! is not acceptable.

pub mod error;
pub mod solver;


pub use error::{Result, SolveError};
pub use solver::{PrioritySolver, Solution};
