//! Typed parameter and resource values.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::states::ExternalState;
use crate::time::Duration;

/// The kind of a [`Value`], used by parameter schemas and resource
/// declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Int,
    Real,
    Bool,
    Text,
    Dur,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Int => "integer",
            ValueKind::Real => "real",
            ValueKind::Bool => "boolean",
            ValueKind::Text => "text",
            ValueKind::Dur => "duration",
        };
        write!(f, "{name}")
    }
}

/// A typed scalar value: activity parameters and simulated resource samples
/// both use this representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Real(f64),
    Bool(bool),
    Text(String),
    Dur(Duration),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Real(_) => ValueKind::Real,
            Value::Bool(_) => ValueKind::Bool,
            Value::Text(_) => ValueKind::Text,
            Value::Dur(_) => ValueKind::Dur,
        }
    }

    /// Compares two values of the same kind; comparing across kinds is a
    /// type error, never a silent `false`.
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        let ordering = match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Real(a), Value::Real(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Dur(a), Value::Dur(b)) => a.cmp(b),
            _ => {
                return Err(ModelError::ValueTypeMismatch {
                    expected: self.kind(),
                    found: other.kind(),
                })
            }
        };
        Ok(ordering)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
            Value::Dur(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::Text(v.to_owned())
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Value {
        Value::Dur(v)
    }
}

/// When to sample a deferred state-query parameter, relative to the owning
/// activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeAnchor {
    /// At the activity's start time.
    Start,
    /// At the activity's end time; requires the duration to be known.
    End,
    /// At a fixed offset after the activity's start time.
    StartPlus(Duration),
}

impl TimeAnchor {
    /// Resolves the anchor to a concrete instant, if the needed activity
    /// times are known.
    pub fn resolve(&self, start: Option<Duration>, end: Option<Duration>) -> Option<Duration> {
        match self {
            TimeAnchor::Start => start,
            TimeAnchor::End => end,
            TimeAnchor::StartPlus(offset) => start.map(|s| s.plus(*offset)),
        }
    }
}

/// An activity parameter: either a concrete value, or a query against an
/// external state deferred until the activity is anchored in time.
#[derive(Clone)]
pub enum Parameter {
    Value(Value),
    Query { state: Arc<dyn ExternalState>, at: TimeAnchor },
}

impl Parameter {
    /// Resolves this parameter to a concrete value for an activity spanning
    /// the given times.
    pub fn resolve(
        &self,
        name: &str,
        start: Option<Duration>,
        end: Option<Duration>,
    ) -> Result<Value> {
        match self {
            Parameter::Value(value) => Ok(value.clone()),
            Parameter::Query { state, at } => {
                let time = at
                    .resolve(start, end)
                    .ok_or_else(|| ModelError::UnresolvedQueryTime { parameter: name.to_owned() })?;
                state.value_at(time).ok_or(ModelError::UnresolvedQueryValue {
                    parameter: name.to_owned(),
                    time,
                })
            }
        }
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Value(value) => write!(f, "Parameter::Value({value:?})"),
            Parameter::Query { at, .. } => write!(f, "Parameter::Query(at {at:?})"),
        }
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Parameter::Value(a), Parameter::Value(b)) => a == b,
            (
                Parameter::Query { state: sa, at: aa },
                Parameter::Query { state: sb, at: ab },
            ) => Arc::ptr_eq(sa, sb) && aa == ab,
            _ => false,
        }
    }
}

impl From<Value> for Parameter {
    fn from(value: Value) -> Parameter {
        Parameter::Value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_kind_comparison_is_an_error() {
        let err = Value::Int(1).compare(&Value::Real(1.0)).unwrap_err();
        assert!(matches!(err, ModelError::ValueTypeMismatch { .. }));
    }

    #[test]
    fn same_kind_comparison_orders() {
        assert_eq!(Value::Int(1).compare(&Value::Int(2)).unwrap(), Ordering::Less);
        assert_eq!(
            Value::Text("b".into()).compare(&Value::Text("a".into())).unwrap(),
            Ordering::Greater
        );
    }

    #[test]
    fn anchors_resolve_against_known_times() {
        let start = Some(Duration::of_seconds(10));
        let end = Some(Duration::of_seconds(20));
        assert_eq!(TimeAnchor::Start.resolve(start, end), start);
        assert_eq!(TimeAnchor::End.resolve(start, None), None);
        assert_eq!(
            TimeAnchor::StartPlus(Duration::of_seconds(5)).resolve(start, None),
            Some(Duration::of_seconds(15))
        );
    }
}
