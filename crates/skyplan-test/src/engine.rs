//! A deterministic event-stepped mock simulation engine.

use std::collections::BTreeMap;

use skyplan_core::{Duration, Value, ValueKind};
use skyplan_sim::{EngineError, ResourceSamples, SerializedActivity, SerializedValue, SimulationEngine};

/// What a resource does while an activity of some type is running.
#[derive(Debug, Clone)]
enum ResourceEffect {
    /// The resource holds this value for the span of the activity.
    Set { resource: String, value: Value },
    /// An integer resource is incremented by this amount for the span.
    Add { resource: String, amount: i64 },
}

/// Table-driven behavior of one activity type.
#[derive(Debug, Clone, Default)]
pub struct TypeBehavior {
    duration: Option<Duration>,
    effects: Vec<ResourceEffect>,
}

impl TypeBehavior {
    /// The activity always takes this long, whatever the caller declares.
    pub fn fixed(duration: Duration) -> TypeBehavior {
        TypeBehavior { duration: Some(duration), effects: Vec::new() }
    }

    /// The activity takes as long as its `duration` argument says.
    pub fn from_argument() -> TypeBehavior {
        TypeBehavior::default()
    }

    /// While running, the named resource holds the given value.
    pub fn setting(mut self, resource: impl Into<String>, value: Value) -> TypeBehavior {
        self.effects.push(ResourceEffect::Set { resource: resource.into(), value });
        self
    }

    /// While running, the named integer resource is incremented.
    pub fn adding(mut self, resource: impl Into<String>, amount: i64) -> TypeBehavior {
        self.effects.push(ResourceEffect::Add { resource: resource.into(), amount });
        self
    }
}

#[derive(Debug, Clone)]
struct ScheduledAct {
    name: String,
    type_name: String,
    start: Duration,
    duration: Duration,
}

/// A mock [`SimulationEngine`].
///
/// Activities run for a table-given or argument-given duration and affect
/// piecewise-constant resources while they run; an activity occupies
/// `[start, start + duration)`, so abutting activities never double-count.
#[derive(Debug, Default)]
pub struct StepEngine {
    behaviors: BTreeMap<String, TypeBehavior>,
    resources: BTreeMap<String, Value>,
    scheduled: Vec<ScheduledAct>,
    clock: Duration,
}

impl StepEngine {
    pub fn new() -> StepEngine {
        StepEngine::default()
    }

    /// Declares a resource with its idle value.
    pub fn with_resource(mut self, name: impl Into<String>, initial: Value) -> StepEngine {
        let _ = self.resources.insert(name.into(), initial);
        self
    }

    /// Declares an activity type's behavior.
    pub fn with_activity(mut self, type_name: impl Into<String>, behavior: TypeBehavior) -> StepEngine {
        let _ = self.behaviors.insert(type_name.into(), behavior);
        self
    }

    fn value_at(&self, resource: &str, time: Duration) -> Value {
        let mut value = self.resources[resource].clone();
        let mut last_set_start: Option<Duration> = None;
        for act in &self.scheduled {
            let running = act.start <= time && time < act.start.plus(act.duration);
            if !running {
                continue;
            }
            let behavior = &self.behaviors[&act.type_name];
            for effect in &behavior.effects {
                match effect {
                    ResourceEffect::Add { resource: r, amount } if r == resource => {
                        if let Value::Int(v) = value {
                            value = Value::Int(v + amount);
                        }
                    }
                    ResourceEffect::Set { resource: r, value: v } if r == resource => {
                        let later = last_set_start.map_or(true, |prev| act.start >= prev);
                        if later {
                            value = v.clone();
                            last_set_start = Some(act.start);
                        }
                    }
                    _ => {}
                }
            }
        }
        value
    }
}

impl SimulationEngine for StepEngine {
    fn reset(&mut self) {
        self.scheduled.clear();
        self.clock = Duration::ZERO;
    }

    fn schedule(
        &mut self,
        name: &str,
        start: Duration,
        activity: &SerializedActivity,
    ) -> Result<(), EngineError> {
        let behavior = self
            .behaviors
            .get(&activity.type_name)
            .ok_or_else(|| EngineError::UnknownActivityType(activity.type_name.clone()))?;
        if start < self.clock {
            return Err(EngineError::StartInPast {
                name: name.to_owned(),
                start,
                clock: self.clock,
            });
        }
        let duration = match behavior.duration {
            Some(duration) => duration,
            None => match activity.arguments.get("duration") {
                Some(SerializedValue::Micros(micros)) => Duration::of_microseconds(*micros),
                _ => {
                    return Err(EngineError::InvalidArguments {
                        activity: name.to_owned(),
                        reason: "missing or malformed duration argument".to_owned(),
                    })
                }
            },
        };
        self.scheduled.push(ScheduledAct {
            name: name.to_owned(),
            type_name: activity.type_name.clone(),
            start,
            duration,
        });
        Ok(())
    }

    fn step_until(&mut self, time: Duration) -> Result<(), EngineError> {
        if time > self.clock {
            self.clock = time;
        }
        Ok(())
    }

    fn clock(&self) -> Duration {
        self.clock
    }

    fn activity_duration(&self, name: &str) -> Option<Duration> {
        self.scheduled
            .iter()
            .find(|act| act.name == name)
            .filter(|act| act.start.plus(act.duration) <= self.clock)
            .map(|act| act.duration)
    }

    fn resource_schemas(&self) -> BTreeMap<String, ValueKind> {
        self.resources.iter().map(|(name, value)| (name.clone(), value.kind())).collect()
    }

    fn resource_samples(&self, until: Duration) -> ResourceSamples {
        let mut boundaries: Vec<Duration> = vec![Duration::ZERO];
        for act in &self.scheduled {
            boundaries.push(act.start);
            boundaries.push(act.start.plus(act.duration));
        }
        boundaries.retain(|t| *t <= until);
        boundaries.sort();
        boundaries.dedup();

        let mut samples = ResourceSamples::new();
        for name in self.resources.keys() {
            let series = boundaries
                .iter()
                .map(|t| (*t, SerializedValue::from_value(&self.value_at(name, *t))))
                .collect();
            let _ = samples.insert(name.clone(), series);
        }
        samples
    }
}
