//! Simulated resource timelines.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::sync::Arc;

use skyplan_core::error::{ModelError, Result};
use skyplan_core::{Duration, ExternalState, TimeWindows, Value, ValueKind, Window};

use crate::engine::SerializedValue;
use crate::error::SimulationError;

#[derive(Debug, Clone)]
struct Timeline {
    kind: ValueKind,
    /// Piecewise-constant values; windows tile the covered span without
    /// overlapping (each piece ends one tick before the next begins).
    pieces: Vec<(Window, Value)>,
}

/// One resource's simulated history, refreshed in place after every
/// regeneration of simulation results.
///
/// Handles are shared (`Arc`) between the facade and any constraints built
/// on the resource, so a constraint always sees the latest simulation. The
/// interior `RefCell` is sound because the solver is single-threaded by
/// contract.
#[derive(Debug)]
pub struct SimResource {
    name: String,
    inner: RefCell<Option<Timeline>>,
}

impl SimResource {
    pub(crate) fn new(name: impl Into<String>) -> Arc<SimResource> {
        Arc::new(SimResource { name: name.into(), inner: RefCell::new(None) })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True until a simulation has populated this resource.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_none()
    }

    /// Rebuilds the timeline from engine samples covering `[ZERO, until]`.
    ///
    /// Runs of equal consecutive samples are compressed into one piece; the
    /// final piece extends to `until`.
    pub(crate) fn replace_timeline(
        &self,
        kind: ValueKind,
        samples: &[(Duration, SerializedValue)],
        until: Duration,
    ) -> std::result::Result<(), SimulationError> {
        let mut pieces: Vec<(Window, Value)> = Vec::new();
        let mut current: Option<(Duration, Value)> = None;

        for (time, sample) in samples {
            let value = sample.into_value(kind).ok_or_else(|| SimulationError::MalformedSample {
                resource: self.name.clone(),
                time: *time,
                kind: kind.to_string(),
            })?;
            match &current {
                Some((_, held)) if *held == value => {}
                Some((since, held)) => {
                    if let Ok(window) = Window::between(*since, time.pred()) {
                        pieces.push((window, held.clone()));
                    }
                    current = Some((*time, value));
                }
                None => current = Some((*time, value)),
            }
        }
        if let Some((since, held)) = current {
            if let Ok(window) = Window::between(since, until.max(since)) {
                pieces.push((window, held));
            }
        }

        *self.inner.borrow_mut() = Some(Timeline { kind, pieces });
        Ok(())
    }

    fn satisfied_windows<F>(&self, windows: &TimeWindows, mut holds: F) -> Result<TimeWindows>
    where
        F: FnMut(&Value) -> Result<bool>,
    {
        let inner = self.inner.borrow();
        let timeline = inner
            .as_ref()
            .ok_or_else(|| ModelError::UninitializedResource(self.name.clone()))?;

        let mut satisfied = TimeWindows::new();
        for (window, value) in &timeline.pieces {
            if holds(value)? {
                satisfied.union(*window);
            }
        }
        satisfied.intersection(windows, false);
        Ok(satisfied)
    }

    fn check_kind(&self, value: &Value) -> Result<()> {
        let inner = self.inner.borrow();
        let timeline = inner
            .as_ref()
            .ok_or_else(|| ModelError::UninitializedResource(self.name.clone()))?;
        if timeline.kind != value.kind() {
            return Err(ModelError::ValueTypeMismatch {
                expected: timeline.kind,
                found: value.kind(),
            });
        }
        Ok(())
    }
}

impl ExternalState for SimResource {
    fn value_at(&self, time: Duration) -> Option<Value> {
        let inner = self.inner.borrow();
        let timeline = inner.as_ref()?;
        timeline
            .pieces
            .iter()
            .rev()
            .find(|(window, _)| window.contains(time))
            .map(|(_, value)| value.clone())
    }

    fn when_value_above(&self, value: &Value, windows: &TimeWindows) -> Result<TimeWindows> {
        self.check_kind(value)?;
        self.satisfied_windows(windows, |held| Ok(held.compare(value)? == Ordering::Greater))
    }

    fn when_value_below(&self, value: &Value, windows: &TimeWindows) -> Result<TimeWindows> {
        self.check_kind(value)?;
        self.satisfied_windows(windows, |held| Ok(held.compare(value)? == Ordering::Less))
    }

    fn when_value_between(
        &self,
        low: &Value,
        high: &Value,
        windows: &TimeWindows,
    ) -> Result<TimeWindows> {
        self.check_kind(low)?;
        self.check_kind(high)?;
        self.satisfied_windows(windows, |held| {
            Ok(held.compare(low)? != Ordering::Less && held.compare(high)? != Ordering::Greater)
        })
    }

    fn when_value_equal(&self, value: &Value, windows: &TimeWindows) -> Result<TimeWindows> {
        self.check_kind(value)?;
        self.satisfied_windows(windows, |held| Ok(held.compare(value)? == Ordering::Equal))
    }

    fn when_value_not_equal(&self, value: &Value, windows: &TimeWindows) -> Result<TimeWindows> {
        self.check_kind(value)?;
        self.satisfied_windows(windows, |held| Ok(held.compare(value)? != Ordering::Equal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seconds(s: i64) -> Duration {
        Duration::of_seconds(s)
    }

    fn resource_with_steps() -> Arc<SimResource> {
        let resource = SimResource::new("battery");
        resource
            .replace_timeline(
                ValueKind::Int,
                &[
                    (Duration::ZERO, SerializedValue::Int(10)),
                    (seconds(10), SerializedValue::Int(10)),
                    (seconds(20), SerializedValue::Int(4)),
                    (seconds(30), SerializedValue::Int(8)),
                ],
                seconds(60),
            )
            .unwrap();
        resource
    }

    #[test]
    fn uninitialized_resource_fails_queries() {
        let resource = SimResource::new("battery");
        assert!(resource.is_empty());
        assert_eq!(resource.value_at(seconds(1)), None);
        let err = resource
            .when_value_above(&Value::Int(1), &TimeWindows::forever())
            .unwrap_err();
        assert!(matches!(err, ModelError::UninitializedResource(_)));
    }

    #[test]
    fn equal_runs_are_compressed() {
        let resource = resource_with_steps();
        assert_eq!(resource.value_at(seconds(5)), Some(Value::Int(10)));
        assert_eq!(resource.value_at(seconds(15)), Some(Value::Int(10)));
        assert_eq!(resource.value_at(seconds(25)), Some(Value::Int(4)));
        assert_eq!(resource.value_at(seconds(45)), Some(Value::Int(8)));
    }

    #[test]
    fn threshold_queries_return_subsets() {
        let resource = resource_with_steps();
        let query = TimeWindows::of(Window::between(Duration::ZERO, seconds(60)).unwrap());

        let above = resource.when_value_above(&Value::Int(5), &query).unwrap();
        assert!(above.contains(seconds(5)));
        assert!(above.contains(seconds(40)));
        assert!(!above.contains(seconds(25)));

        let below = resource.when_value_below(&Value::Int(5), &query).unwrap();
        assert!(below.contains(seconds(25)));
        assert!(!below.contains(seconds(5)));
    }

    #[test]
    fn kind_mismatch_is_an_error() {
        let resource = resource_with_steps();
        let err = resource
            .when_value_equal(&Value::Text("full".into()), &TimeWindows::forever())
            .unwrap_err();
        assert!(matches!(err, ModelError::ValueTypeMismatch { .. }));
    }
}
