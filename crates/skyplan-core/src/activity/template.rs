//! Activity creation templates.
//!
//! A creation template is a matching expression that also knows how to
//! synthesize a new instance when no match exists, roughly an activity
//! preset. Creation picks the minimum value of every applicable range; ties
//! always break toward the earliest start and the shortest duration, which is
//! a documented policy rather than an implementation accident.

use std::sync::Arc;

use crate::error::{ModelError, Result};
use crate::time::Duration;
use crate::value::{Parameter, TimeAnchor, Value};
use crate::windows::Window;

use super::expression::{ActivityExpression, ActivityExpressionBuilder};
use super::instance::ActivityInstance;
use super::types::ActivityType;

/// A matchable, creatable partial activity specification.
#[derive(Debug, Clone)]
pub struct ActivityCreationTemplate {
    expression: ActivityExpression,
}

impl ActivityCreationTemplate {
    /// Shorthand for a type-only template.
    pub fn of_type(activity_type: Arc<ActivityType>) -> ActivityCreationTemplate {
        ActivityCreationTemplate { expression: ActivityExpression::of_type(activity_type) }
    }

    pub fn builder() -> ActivityCreationTemplateBuilder {
        ActivityCreationTemplateBuilder::default()
    }

    /// The matching predicate of this template.
    pub fn expression(&self) -> &ActivityExpression {
        &self.expression
    }

    pub fn activity_type(&self) -> Option<&Arc<ActivityType>> {
        self.expression.activity_type()
    }

    pub fn duration_range(&self) -> Option<&Window> {
        self.expression.duration_range()
    }

    /// Whether the given activity satisfies this template's criteria.
    pub fn matches(&self, act: &ActivityInstance) -> Result<bool> {
        self.expression.matches(act)
    }

    /// Synthesizes a new activity instance from the template defaults.
    ///
    /// At least two of the start, end and duration windows must be
    /// specified; the third quantity is derived from the other two. The
    /// minimum of each given range is used.
    ///
    /// # Errors
    ///
    /// Fails when the activity type is unset, fewer than two temporal
    /// specifiers are present, or the specifiers contradict each other.
    pub fn create_activity(&self, name: impl Into<String>) -> Result<ActivityInstance> {
        let activity_type =
            self.expression.activity_type().ok_or(ModelError::MissingActivityType)?.clone();

        let start_range = self.expression.start_range;
        let end_range = self.expression.end_range;
        let duration_range = self.expression.duration_range;

        let (start, duration) = match (start_range, end_range, duration_range) {
            (Some(s), Some(e), Some(d)) => {
                let start = s.start();
                let duration = d.start();
                let end = start.plus(duration);
                if !e.contains(end) {
                    return Err(ModelError::InconsistentTemplate(format!(
                        "earliest start {start} plus shortest duration {duration} \
                         falls outside the end window {e}"
                    )));
                }
                (start, duration)
            }
            (Some(s), Some(e), None) => {
                let start = s.start();
                let end = e.start();
                if end < start {
                    return Err(ModelError::InconsistentTemplate(format!(
                        "earliest end {end} precedes earliest start {start}"
                    )));
                }
                (start, end.minus(start))
            }
            (Some(s), None, Some(d)) => (s.start(), d.start()),
            (None, Some(e), Some(d)) => {
                let end = e.start();
                let duration = d.start();
                if duration > end {
                    return Err(ModelError::InconsistentTemplate(format!(
                        "shortest duration {duration} cannot finish by earliest end {end}"
                    )));
                }
                (end.minus(duration), duration)
            }
            _ => return Err(ModelError::TemplateUnderspecified),
        };

        let mut act = ActivityInstance::scheduled(name, activity_type, start);
        act.set_duration(duration)?;
        act.set_parameters(self.expression.parameters.clone());
        Ok(act)
    }
}

/// Fluent builder for [`ActivityCreationTemplate`].
#[derive(Debug, Default)]
pub struct ActivityCreationTemplateBuilder {
    inner: ActivityExpressionBuilder,
}

impl ActivityCreationTemplateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_type(mut self, activity_type: Arc<ActivityType>) -> Self {
        self.inner = self.inner.of_type(activity_type);
        self
    }

    pub fn starts_in(mut self, range: Window) -> Self {
        self.inner = self.inner.starts_in(range);
        self
    }

    pub fn ends_in(mut self, range: Window) -> Self {
        self.inner = self.inner.ends_in(range);
        self
    }

    pub fn starts_or_ends_in(mut self, range: Window) -> Self {
        self.inner = self.inner.starts_or_ends_in(range);
        self
    }

    pub fn duration_in(mut self, range: Window) -> Self {
        self.inner = self.inner.duration_in(range);
        self
    }

    /// Fixes the created duration to a single value.
    pub fn duration(mut self, duration: Duration) -> Self {
        self.inner = self.inner.duration_in(Window::at(duration));
        self
    }

    pub fn name_matches(mut self, pattern: impl Into<String>) -> Self {
        self.inner = self.inner.name_matches(pattern);
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inner = self.inner.with_parameter(name, value);
        self
    }

    pub fn with_state_parameter(
        mut self,
        name: impl Into<String>,
        state: Arc<dyn crate::states::ExternalState>,
        at: TimeAnchor,
    ) -> Self {
        self.inner = self.inner.with_state_parameter(name, state, at);
        self
    }

    /// Bootstraps this builder from an existing template.
    pub fn based_on(mut self, template: &ActivityCreationTemplate) -> Self {
        self.inner = self.inner.based_on(&template.expression);
        self
    }

    /// Finishes the builder.
    ///
    /// # Errors
    ///
    /// Fails if no activity type was given or the name pattern does not
    /// compile. Temporal sufficiency is checked at creation time, since a
    /// template may legitimately be match-only.
    pub fn build(self) -> Result<ActivityCreationTemplate> {
        let expression = self.inner.build()?;
        if expression.activity_type().is_none() {
            return Err(ModelError::MissingActivityType);
        }
        Ok(ActivityCreationTemplate { expression })
    }
}

/// The logical OR of a non-empty list of creation templates.
///
/// Matching succeeds if any member matches; creation delegates to the first
/// member. The member list is copied at construction, so later mutation of
/// the source collection cannot alias into the disjunction.
#[derive(Debug, Clone)]
pub struct ActivityCreationTemplateDisjunction {
    templates: Vec<ActivityCreationTemplate>,
}

impl ActivityCreationTemplateDisjunction {
    pub fn new(templates: &[ActivityCreationTemplate]) -> Result<Self> {
        if templates.is_empty() {
            return Err(ModelError::EmptyDisjunction);
        }
        Ok(ActivityCreationTemplateDisjunction { templates: templates.to_vec() })
    }

    pub fn templates(&self) -> &[ActivityCreationTemplate] {
        &self.templates
    }

    pub fn matches(&self, act: &ActivityInstance) -> Result<bool> {
        for template in &self.templates {
            if template.matches(act)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn create_activity(&self, name: impl Into<String>) -> Result<ActivityInstance> {
        self.templates[0].create_activity(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observe() -> Arc<ActivityType> {
        Arc::new(ActivityType::new("Observe"))
    }

    fn window(a: i64, b: i64) -> Window {
        Window::between(Duration::of_seconds(a), Duration::of_seconds(b)).unwrap()
    }

    #[test]
    fn creation_picks_minimum_values() {
        let template = ActivityCreationTemplate::builder()
            .of_type(observe())
            .starts_in(window(10, 20))
            .duration_in(window(5, 8))
            .build()
            .unwrap();

        let act = template.create_activity("obs").unwrap();
        assert_eq!(act.start_time(), Some(Duration::of_seconds(10)));
        assert_eq!(act.duration(), Some(Duration::of_seconds(5)));
    }

    #[test]
    fn creation_derives_duration_from_start_and_end() {
        let template = ActivityCreationTemplate::builder()
            .of_type(observe())
            .starts_in(window(10, 20))
            .ends_in(window(15, 30))
            .build()
            .unwrap();

        let act = template.create_activity("obs").unwrap();
        assert_eq!(act.start_time(), Some(Duration::of_seconds(10)));
        assert_eq!(act.duration(), Some(Duration::of_seconds(5)));
    }

    #[test]
    fn creation_derives_start_from_end_and_duration() {
        let template = ActivityCreationTemplate::builder()
            .of_type(observe())
            .ends_in(window(20, 30))
            .duration(Duration::of_seconds(5))
            .build()
            .unwrap();

        let act = template.create_activity("obs").unwrap();
        assert_eq!(act.start_time(), Some(Duration::of_seconds(15)));
    }

    #[test]
    fn one_specifier_is_not_enough() {
        let template = ActivityCreationTemplate::builder()
            .of_type(observe())
            .starts_in(window(0, 10))
            .build()
            .unwrap();
        let err = template.create_activity("obs").unwrap_err();
        assert!(matches!(err, ModelError::TemplateUnderspecified));
    }

    #[test]
    fn missing_type_fails_at_build() {
        let err = ActivityCreationTemplate::builder()
            .starts_in(window(0, 10))
            .duration(Duration::of_seconds(1))
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::MissingActivityType));
    }

    #[test]
    fn contradictory_windows_fail_at_creation() {
        let template = ActivityCreationTemplate::builder()
            .of_type(observe())
            .starts_in(window(10, 20))
            .ends_in(window(0, 5))
            .build()
            .unwrap();
        let err = template.create_activity("obs").unwrap_err();
        assert!(matches!(err, ModelError::InconsistentTemplate(_)));
    }

    #[test]
    fn disjunction_requires_members_and_delegates_creation() {
        assert!(matches!(
            ActivityCreationTemplateDisjunction::new(&[]).unwrap_err(),
            ModelError::EmptyDisjunction
        ));

        let first = ActivityCreationTemplate::builder()
            .of_type(observe())
            .starts_in(window(0, 1))
            .duration(Duration::of_seconds(2))
            .build()
            .unwrap();
        let second = ActivityCreationTemplate::builder()
            .of_type(observe())
            .starts_in(window(50, 60))
            .duration(Duration::of_seconds(2))
            .build()
            .unwrap();

        let disjunction =
            ActivityCreationTemplateDisjunction::new(&[first, second]).unwrap();
        let act = disjunction.create_activity("obs").unwrap();
        assert_eq!(act.start_time(), Some(Duration::ZERO));

        let matching = ActivityInstance::spanning(
            "later",
            observe(),
            Duration::of_seconds(55),
            Duration::of_seconds(2),
        )
        .unwrap();
        assert!(disjunction.matches(&matching).unwrap());
    }
}
