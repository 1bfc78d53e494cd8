//! Canned activity types and instances.

use std::sync::Arc;

use skyplan_core::{ActivityInstance, ActivityType, Duration};

/// A plain activity type with the given name.
pub fn typed(name: &str) -> Arc<ActivityType> {
    Arc::new(ActivityType::new(name))
}

/// The workhorse observation type used across scheduler tests.
pub fn observation_type() -> Arc<ActivityType> {
    typed("Observation")
}

/// A scheduled instance with start and duration given in seconds.
pub fn scheduled_activity(
    name: &str,
    activity_type: Arc<ActivityType>,
    start_seconds: i64,
    duration_seconds: i64,
) -> ActivityInstance {
    ActivityInstance::spanning(
        name,
        activity_type,
        Duration::of_seconds(start_seconds),
        Duration::of_seconds(duration_seconds),
    )
    .expect("fixture durations are non-negative")
}
