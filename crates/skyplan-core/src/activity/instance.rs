//! Activity instances.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ModelError, Result};
use crate::time::Duration;
use crate::value::{Parameter, Value};

use super::types::ActivityType;

/// A specific, time-placed (or to-be-placed) execution of a mission
/// behavior.
///
/// An instance is mutable while the solver shapes it (start, duration and
/// parameters are assigned before insertion) and is identified by its name
/// once it joins a plan. The duration, when set, is never negative.
#[derive(Debug, Clone)]
pub struct ActivityInstance {
    name: String,
    activity_type: Arc<ActivityType>,
    start: Option<Duration>,
    duration: Option<Duration>,
    parameters: BTreeMap<String, Parameter>,
}

impl ActivityInstance {
    /// Creates an unscheduled instance of the given type.
    pub fn new(name: impl Into<String>, activity_type: Arc<ActivityType>) -> ActivityInstance {
        ActivityInstance {
            name: name.into(),
            activity_type,
            start: None,
            duration: None,
            parameters: BTreeMap::new(),
        }
    }

    /// Creates an instance scheduled at the given start time.
    pub fn scheduled(
        name: impl Into<String>,
        activity_type: Arc<ActivityType>,
        start: Duration,
    ) -> ActivityInstance {
        let mut act = ActivityInstance::new(name, activity_type);
        act.start = Some(start);
        act
    }

    /// Creates an instance scheduled at the given start with a known
    /// duration; negative durations are rejected.
    pub fn spanning(
        name: impl Into<String>,
        activity_type: Arc<ActivityType>,
        start: Duration,
        duration: Duration,
    ) -> Result<ActivityInstance> {
        let mut act = ActivityInstance::scheduled(name, activity_type, start);
        act.set_duration(duration)?;
        Ok(act)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn activity_type(&self) -> &Arc<ActivityType> {
        &self.activity_type
    }

    pub fn start_time(&self) -> Option<Duration> {
        self.start
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// The end time, known once both start and duration are.
    pub fn end_time(&self) -> Option<Duration> {
        match (self.start, self.duration) {
            (Some(start), Some(duration)) => Some(start.plus(duration)),
            _ => None,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_start_time(&mut self, start: Duration) {
        self.start = Some(start);
    }

    pub fn set_duration(&mut self, duration: Duration) -> Result<()> {
        if duration.is_negative() {
            return Err(ModelError::NegativeDuration { activity: self.name.clone(), duration });
        }
        self.duration = Some(duration);
        Ok(())
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, parameter: impl Into<Parameter>) {
        self.parameters.insert(name.into(), parameter.into());
    }

    pub fn parameters(&self) -> &BTreeMap<String, Parameter> {
        &self.parameters
    }

    pub fn set_parameters(&mut self, parameters: BTreeMap<String, Parameter>) {
        self.parameters = parameters;
    }

    /// Resolves every deferred state-query parameter into a concrete value
    /// using this instance's own start and end times.
    pub fn resolve_parameters(&mut self) -> Result<()> {
        let start = self.start;
        let end = self.end_time();
        for (name, parameter) in self.parameters.iter_mut() {
            if let Parameter::Query { .. } = parameter {
                let value = parameter.resolve(name, start, end)?;
                *parameter = Parameter::Value(value);
            }
        }
        Ok(())
    }

    /// Resolves a single parameter to a value without mutating the instance.
    pub fn parameter_value(&self, name: &str) -> Option<Result<Value>> {
        self.parameters
            .get(name)
            .map(|p| p.resolve(name, self.start, self.end_time()))
    }

    /// Property-wise equality: type, start, duration and parameters, but not
    /// the instance name. Used for strict matching of procedurally generated
    /// activities against existing plan contents.
    pub fn matches_in_properties(&self, other: &ActivityInstance) -> bool {
        *self.activity_type == *other.activity_type
            && self.start == other.start
            && self.duration == other.duration
            && self.parameters == other.parameters
    }

    /// The instance with the earliest end time, if the slice is non-empty.
    /// Instances without an end time are ignored.
    pub fn with_earliest_end<'a>(acts: &[&'a ActivityInstance]) -> Option<&'a ActivityInstance> {
        acts.iter().filter(|a| a.end_time().is_some()).min_by_key(|a| a.end_time()).copied()
    }

    /// The instance with the latest end time, if the slice is non-empty.
    pub fn with_latest_end<'a>(acts: &[&'a ActivityInstance]) -> Option<&'a ActivityInstance> {
        acts.iter().filter(|a| a.end_time().is_some()).max_by_key(|a| a.end_time()).copied()
    }

    /// The instance with the earliest start time, if any instance has one.
    pub fn with_earliest_start<'a>(acts: &[&'a ActivityInstance]) -> Option<&'a ActivityInstance> {
        acts.iter().filter(|a| a.start_time().is_some()).min_by_key(|a| a.start_time()).copied()
    }

    /// The instance with the latest start time, if any instance has one.
    pub fn with_latest_start<'a>(acts: &[&'a ActivityInstance]) -> Option<&'a ActivityInstance> {
        acts.iter().filter(|a| a.start_time().is_some()).max_by_key(|a| a.start_time()).copied()
    }
}

impl fmt::Display for ActivityInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.activity_type.name(), self.name)?;
        if let Some(start) = self.start {
            write!(f, "@{start}")?;
        }
        if let Some(duration) = self.duration {
            write!(f, "+{duration}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observe() -> Arc<ActivityType> {
        Arc::new(ActivityType::new("Observe"))
    }

    #[test]
    fn negative_duration_is_rejected() {
        let mut act = ActivityInstance::new("obs1", observe());
        let err = act.set_duration(Duration::of_seconds(-1)).unwrap_err();
        assert!(matches!(err, ModelError::NegativeDuration { .. }));
    }

    #[test]
    fn end_time_needs_start_and_duration() {
        let mut act = ActivityInstance::new("obs1", observe());
        assert_eq!(act.end_time(), None);
        act.set_start_time(Duration::of_seconds(10));
        assert_eq!(act.end_time(), None);
        act.set_duration(Duration::of_seconds(5)).unwrap();
        assert_eq!(act.end_time(), Some(Duration::of_seconds(15)));
    }

    #[test]
    fn property_matching_ignores_names() {
        let a = ActivityInstance::spanning("a", observe(), Duration::ZERO, Duration::of_seconds(1))
            .unwrap();
        let b = ActivityInstance::spanning("b", observe(), Duration::ZERO, Duration::of_seconds(1))
            .unwrap();
        assert!(a.matches_in_properties(&b));
    }

    #[test]
    fn selectors_pick_extremes() {
        let early =
            ActivityInstance::spanning("e", observe(), Duration::ZERO, Duration::of_seconds(1))
                .unwrap();
        let late = ActivityInstance::spanning(
            "l",
            observe(),
            Duration::of_seconds(5),
            Duration::of_seconds(1),
        )
        .unwrap();
        let acts = vec![&early, &late];
        assert_eq!(ActivityInstance::with_earliest_start(&acts).unwrap().name(), "e");
        assert_eq!(ActivityInstance::with_latest_end(&acts).unwrap().name(), "l");
    }
}
