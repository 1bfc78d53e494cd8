//! The plan: the mutable solution workspace of one solve.

use std::collections::BTreeMap;

use crate::activity::{ActivityExpression, ActivityInstance};
use crate::error::{ModelError, Result};
use crate::time::Duration;
use crate::windows::{TimeWindows, Window};

/// A set of time-placed activity instances, indexed by name.
///
/// Invariants: no two activities share a name, and every inserted activity
/// has a start time. The by-time view is therefore always totally ordered
/// and never contains an absent start.
///
/// A plan is created once per solving attempt, mutated throughout it, and
/// never shared across concurrent solves.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    activities: BTreeMap<String, ActivityInstance>,
}

impl Plan {
    pub fn new() -> Plan {
        Plan::default()
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Adds an activity to the plan.
    ///
    /// # Errors
    ///
    /// Fails if the activity has no start time or its name is already
    /// taken.
    pub fn insert(&mut self, act: ActivityInstance) -> Result<()> {
        if act.start_time().is_none() {
            return Err(ModelError::MissingStartTime(act.name().to_owned()));
        }
        if self.activities.contains_key(act.name()) {
            return Err(ModelError::DuplicateActivity(act.name().to_owned()));
        }
        let _ = self.activities.insert(act.name().to_owned(), act);
        Ok(())
    }

    pub fn insert_all<I: IntoIterator<Item = ActivityInstance>>(&mut self, acts: I) -> Result<()> {
        for act in acts {
            self.insert(act)?;
        }
        Ok(())
    }

    /// Removes an activity by name, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<ActivityInstance> {
        self.activities.remove(name)
    }

    pub fn remove_all<'a, I: IntoIterator<Item = &'a str>>(&mut self, names: I) {
        for name in names {
            let _ = self.activities.remove(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&ActivityInstance> {
        self.activities.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.activities.contains_key(name)
    }

    /// Overwrites the duration of an already-inserted activity.
    pub fn set_duration(&mut self, name: &str, duration: Duration) -> Result<()> {
        match self.activities.get_mut(name) {
            Some(act) => act.set_duration(duration),
            None => Err(ModelError::UnknownActivity(name.to_owned())),
        }
    }

    /// All activities in non-decreasing start-time order.
    pub fn activities_by_time(&self) -> Vec<&ActivityInstance> {
        let mut acts: Vec<&ActivityInstance> = self.activities.values().collect();
        acts.sort_by_key(|a| a.start_time());
        acts
    }

    /// All activities of the named type, in name order.
    pub fn activities_of_type(&self, type_name: &str) -> Vec<&ActivityInstance> {
        self.activities.values().filter(|a| a.activity_type().name() == type_name).collect()
    }

    /// All activities matching the given expression, in name order.
    pub fn find(&self, expression: &ActivityExpression) -> Result<Vec<&ActivityInstance>> {
        let mut matches = Vec::new();
        for act in self.activities.values() {
            if expression.matches(act)? {
                matches.push(act);
            }
        }
        Ok(matches)
    }

    /// The time spans occupied by activities of the named type. Activities
    /// without a duration occupy their start instant.
    pub fn occupancy_of_type(&self, type_name: &str) -> TimeWindows {
        let mut occupied = TimeWindows::new();
        for act in self.activities_of_type(type_name) {
            if let Some(start) = act.start_time() {
                let end = act.end_time().unwrap_or(start);
                if let Ok(window) = Window::between(start, end) {
                    occupied.union(window);
                }
            }
        }
        occupied
    }

    /// How many activities of the named type overlap the given window.
    pub fn count_of_type_overlapping(&self, type_name: &str, window: &Window) -> usize {
        self.activities_of_type(type_name)
            .into_iter()
            .filter(|act| {
                act.start_time().is_some_and(|start| {
                    let end = act.end_time().unwrap_or(start);
                    start <= window.end() && end >= window.start()
                })
            })
            .count()
    }

    /// Iterates all activities in name order.
    pub fn iter(&self) -> impl Iterator<Item = &ActivityInstance> {
        self.activities.values()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ActivityType;

    fn observe() -> Arc<ActivityType> {
        Arc::new(ActivityType::new("Observe"))
    }

    fn act(name: &str, start: i64, dur: i64) -> ActivityInstance {
        ActivityInstance::spanning(
            name,
            observe(),
            Duration::of_seconds(start),
            Duration::of_seconds(dur),
        )
        .unwrap()
    }

    #[test]
    fn insert_requires_a_start_time() {
        let mut plan = Plan::new();
        let unscheduled = ActivityInstance::new("loose", observe());
        let err = plan.insert(unscheduled).unwrap_err();
        assert!(matches!(err, ModelError::MissingStartTime(_)));
    }

    #[test]
    fn names_are_unique() {
        let mut plan = Plan::new();
        plan.insert(act("a", 0, 1)).unwrap();
        let err = plan.insert(act("a", 5, 1)).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateActivity(_)));
    }

    #[test]
    fn by_time_view_is_sorted() {
        let mut plan = Plan::new();
        plan.insert(act("late", 50, 1)).unwrap();
        plan.insert(act("early", 5, 1)).unwrap();
        plan.insert(act("middle", 20, 1)).unwrap();
        let names: Vec<&str> = plan.activities_by_time().iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["early", "middle", "late"]);
    }

    #[test]
    fn occupancy_merges_overlapping_spans() {
        let mut plan = Plan::new();
        plan.insert(act("a", 0, 10)).unwrap();
        plan.insert(act("b", 5, 10)).unwrap();
        let occupied = plan.occupancy_of_type("Observe");
        assert_eq!(occupied.len(), 1);
        assert_eq!(occupied.maximum(), Some(Duration::of_seconds(15)));
    }

    #[test]
    fn overlap_counting_is_inclusive() {
        let mut plan = Plan::new();
        plan.insert(act("a", 0, 10)).unwrap();
        plan.insert(act("b", 30, 10)).unwrap();
        let scope = Window::between(Duration::of_seconds(10), Duration::of_seconds(20)).unwrap();
        assert_eq!(plan.count_of_type_overlapping("Observe", &scope), 1);
        assert_eq!(plan.count_of_type_overlapping("Downlink", &scope), 0);
    }
}
