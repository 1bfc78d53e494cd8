//! Shared test fixtures for skyplan crates.
//!
//! This crate provides a deterministic mock simulation engine and canned
//! activity types for testing. It does NOT depend on `skyplan-solver`, so
//! the solver can consume it as a dev-dependency without a cycle.
//!
//! - [`engine`] - [`StepEngine`], an event-stepped engine with table-driven
//!   activity behaviors and piecewise-constant resources
//! - [`fixtures`] - canned activity types and instance helpers
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! skyplan-test = { workspace = true }
//! ```

pub mod engine;
pub mod fixtures;

pub use engine::{StepEngine, TypeBehavior};
pub use fixtures::{observation_type, scheduled_activity, typed};
