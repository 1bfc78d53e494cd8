//! The simulation engine boundary.
//!
//! The discrete-event engine that actually executes mission behaviors is an
//! external collaborator. The scheduler only assumes the contract below: an
//! event-stepped black box that accepts typed activities, advances its clock
//! on demand, and reports resource samples and activity durations. Engine
//! values cross the boundary in a flat serialized representation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use skyplan_core::{Duration, Value, ValueKind};

use crate::error::EngineError;

/// A value in the engine's wire representation: strings (enums travel as
/// their variant name), integers, reals, booleans, and durations as
/// microsecond counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SerializedValue {
    Text(String),
    Int(i64),
    Real(f64),
    Bool(bool),
    Micros(i64),
}

impl SerializedValue {
    /// Converts a scheduler value into the engine representation.
    pub fn from_value(value: &Value) -> SerializedValue {
        match value {
            Value::Text(v) => SerializedValue::Text(v.clone()),
            Value::Int(v) => SerializedValue::Int(*v),
            Value::Real(v) => SerializedValue::Real(*v),
            Value::Bool(v) => SerializedValue::Bool(*v),
            Value::Dur(v) => SerializedValue::Micros(v.in_microseconds()),
        }
    }

    /// Converts back into a scheduler value of the expected kind, if the
    /// representation fits.
    pub fn into_value(&self, kind: ValueKind) -> Option<Value> {
        match (self, kind) {
            (SerializedValue::Text(v), ValueKind::Text) => Some(Value::Text(v.clone())),
            (SerializedValue::Int(v), ValueKind::Int) => Some(Value::Int(*v)),
            (SerializedValue::Real(v), ValueKind::Real) => Some(Value::Real(*v)),
            (SerializedValue::Bool(v), ValueKind::Bool) => Some(Value::Bool(*v)),
            (SerializedValue::Micros(v), ValueKind::Dur) => {
                Some(Value::Dur(Duration::of_microseconds(*v)))
            }
            _ => None,
        }
    }
}

/// A typed activity in the form the engine accepts: the activity type name
/// plus serialized arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedActivity {
    pub type_name: String,
    pub arguments: BTreeMap<String, SerializedValue>,
}

impl SerializedActivity {
    pub fn new(type_name: impl Into<String>) -> SerializedActivity {
        SerializedActivity { type_name: type_name.into(), arguments: BTreeMap::new() }
    }
}

/// Per-resource sample series as reported by the engine: change points with
/// the value taken from that time on.
pub type ResourceSamples = BTreeMap<String, Vec<(Duration, SerializedValue)>>;

/// The discrete-event simulation engine contract.
///
/// The engine owns its own event queue and clock. The scheduler drives it
/// strictly forward: activities are scheduled at or after the clock, the
/// clock only advances, and `reset` is the only way back to time zero.
pub trait SimulationEngine: std::fmt::Debug {
    /// Returns the engine to time zero with an empty schedule.
    fn reset(&mut self);

    /// Adds an activity starting at `start`, which must not precede the
    /// engine clock.
    fn schedule(
        &mut self,
        name: &str,
        start: Duration,
        activity: &SerializedActivity,
    ) -> std::result::Result<(), EngineError>;

    /// Advances the event clock to the given time, executing everything
    /// scheduled before it. A time behind the clock is a no-op.
    fn step_until(&mut self, time: Duration) -> std::result::Result<(), EngineError>;

    /// The engine's current clock.
    fn clock(&self) -> Duration;

    /// The simulated duration of a named activity, once it has finished
    /// executing; absent while it is still running or not yet started.
    fn activity_duration(&self, name: &str) -> Option<Duration>;

    /// The declared kind of every resource the engine models.
    fn resource_schemas(&self) -> BTreeMap<String, ValueKind>;

    /// Sample series for every resource, covering `[ZERO, until]`.
    fn resource_samples(&self, until: Duration) -> ResourceSamples;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_round_trip_preserves_kind() {
        let cases = [
            (Value::Int(3), ValueKind::Int),
            (Value::Real(2.5), ValueKind::Real),
            (Value::Bool(true), ValueKind::Bool),
            (Value::Text("scan".into()), ValueKind::Text),
            (Value::Dur(Duration::of_seconds(9)), ValueKind::Dur),
        ];
        for (value, kind) in cases {
            let wire = SerializedValue::from_value(&value);
            assert_eq!(wire.into_value(kind), Some(value));
        }
    }

    #[test]
    fn kind_mismatch_does_not_deserialize() {
        let wire = SerializedValue::Int(3);
        assert_eq!(wire.into_value(ValueKind::Real), None);
    }
}
