//! skyplan-sim - Incremental simulation facade for the skyplan scheduler
//!
//! This crate wraps an external discrete-event simulation engine so the
//! solver can ask "what would happen if this activity existed" without
//! re-simulating from scratch every time:
//! - The [`SimulationEngine`] boundary trait and serialized value types
//! - The incremental driver with restart-and-replay on out-of-order inserts
//! - Resource histories published as [`SimResource`] handles
//! - The [`SimulationFacade`] tying it together for the solver

pub mod driver;
pub mod engine;
pub mod error;
pub mod facade;
pub mod resource;

pub use driver::IncrementalDriver;
pub use engine::{ResourceSamples, SerializedActivity, SerializedValue, SimulationEngine};
pub use error::{EngineError, Result, SimulationError};
pub use facade::SimulationFacade;
pub use resource::SimResource;
