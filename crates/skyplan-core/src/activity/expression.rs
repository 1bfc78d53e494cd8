//! Activity matching expressions.
//!
//! An expression is a partial specification of an activity instance, used to
//! find candidates in a plan: a conjunction of optional criteria that reads
//! like a predicate-logic clause when built fluently. Matching is strict and
//! short-circuits on the first failed criterion.

use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;

use crate::error::Result;
use crate::time::Duration;
use crate::value::{Parameter, TimeAnchor, Value};
use crate::windows::{TimeWindows, Window};

use super::instance::ActivityInstance;
use super::types::ActivityType;

/// A conjunctive matching predicate over activity instances.
#[derive(Debug, Clone, Default)]
pub struct ActivityExpression {
    pub(super) activity_type: Option<Arc<ActivityType>>,
    pub(super) start_range: Option<Window>,
    pub(super) end_range: Option<Window>,
    pub(super) start_or_end_range: Option<Window>,
    pub(super) start_or_end_windows: Option<TimeWindows>,
    pub(super) duration_range: Option<Window>,
    pub(super) name_pattern: Option<Regex>,
    pub(super) parameters: BTreeMap<String, Parameter>,
}

impl ActivityExpression {
    /// Shorthand for a type-only predicate.
    pub fn of_type(activity_type: Arc<ActivityType>) -> ActivityExpression {
        ActivityExpression { activity_type: Some(activity_type), ..Default::default() }
    }

    pub fn builder() -> ActivityExpressionBuilder {
        ActivityExpressionBuilder::default()
    }

    pub fn activity_type(&self) -> Option<&Arc<ActivityType>> {
        self.activity_type.as_ref()
    }

    pub fn start_range(&self) -> Option<&Window> {
        self.start_range.as_ref()
    }

    pub fn end_range(&self) -> Option<&Window> {
        self.end_range.as_ref()
    }

    pub fn duration_range(&self) -> Option<&Window> {
        self.duration_range.as_ref()
    }

    /// Whether the given activity meets every criterion of this expression.
    ///
    /// Deterministic and side-effect free; a deferred state-query parameter
    /// criterion is sampled at its anchored time, which must resolve to a
    /// single instant for the activity under test.
    pub fn matches(&self, act: &ActivityInstance) -> Result<bool> {
        if let Some(wanted) = &self.activity_type {
            if **wanted != **act.activity_type() {
                return Ok(false);
            }
        }

        if let Some(range) = &self.start_range {
            match act.start_time() {
                Some(start) if range.contains(start) => {}
                _ => return Ok(false),
            }
        }

        if let Some(range) = &self.start_or_end_range {
            let start_in = act.start_time().is_some_and(|t| range.contains(t));
            let end_in = act.end_time().is_some_and(|t| range.contains(t));
            if !start_in && !end_in {
                return Ok(false);
            }
        }

        if let Some(windows) = &self.start_or_end_windows {
            let start_in = act.start_time().is_some_and(|t| windows.contains(t));
            let end_in = act.end_time().is_some_and(|t| windows.contains(t));
            if !start_in && !end_in {
                return Ok(false);
            }
        }

        if let Some(range) = &self.end_range {
            match act.end_time() {
                Some(end) if range.contains(end) => {}
                _ => return Ok(false),
            }
        }

        if let Some(range) = &self.duration_range {
            match act.duration() {
                Some(duration) if range.contains(duration) => {}
                _ => return Ok(false),
            }
        }

        if let Some(pattern) = &self.name_pattern {
            if !pattern.is_match(act.name()) {
                return Ok(false);
            }
        }

        for (name, criterion) in &self.parameters {
            // A criterion only constrains parameters the instance carries.
            let Some(actual) = act.parameters().get(name) else { continue };
            let wanted: Value = criterion.resolve(name, act.start_time(), act.end_time())?;
            let actual: Value = actual.resolve(name, act.start_time(), act.end_time())?;
            if wanted != actual {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// Fluent builder for [`ActivityExpression`].
///
/// Each term added becomes part of a logical conjunction; re-specifying a
/// term replaces the previous one. The builder is consumed by `build()`.
#[derive(Debug, Default)]
pub struct ActivityExpressionBuilder {
    activity_type: Option<Arc<ActivityType>>,
    start_range: Option<Window>,
    end_range: Option<Window>,
    start_or_end_range: Option<Window>,
    start_or_end_windows: Option<TimeWindows>,
    duration_range: Option<Window>,
    name_pattern: Option<String>,
    parameters: BTreeMap<String, Parameter>,
}

impl ActivityExpressionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires a specific activity type.
    pub fn of_type(mut self, activity_type: Arc<ActivityType>) -> Self {
        self.activity_type = Some(activity_type);
        self
    }

    /// Requires the scheduled start time to fall in the given range.
    pub fn starts_in(mut self, range: Window) -> Self {
        self.start_range = Some(range);
        self
    }

    /// Requires the end time to fall in the given range.
    pub fn ends_in(mut self, range: Window) -> Self {
        self.end_range = Some(range);
        self
    }

    /// Requires the start or the end time to fall in the given range.
    pub fn starts_or_ends_in(mut self, range: Window) -> Self {
        self.start_or_end_range = Some(range);
        self
    }

    /// Requires the start or the end time to fall in the given window set.
    pub fn starts_or_ends_in_windows(mut self, windows: TimeWindows) -> Self {
        self.start_or_end_windows = Some(windows);
        self
    }

    /// Requires the duration to fall in the given range.
    pub fn duration_in(mut self, range: Window) -> Self {
        self.duration_range = Some(range);
        self
    }

    /// Requires the instance name to fully match a regular expression.
    pub fn name_matches(mut self, pattern: impl Into<String>) -> Self {
        self.name_pattern = Some(pattern.into());
        self
    }

    /// Requires a parameter to equal the given value.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), Parameter::Value(value.into()));
        self
    }

    /// Requires a parameter to equal the value of an external state, sampled
    /// at the given anchor of the instance under test.
    pub fn with_state_parameter(
        mut self,
        name: impl Into<String>,
        state: Arc<dyn crate::states::ExternalState>,
        at: TimeAnchor,
    ) -> Self {
        self.parameters.insert(name.into(), Parameter::Query { state, at });
        self
    }

    /// Bootstraps this builder from an existing expression.
    pub fn based_on(mut self, expression: &ActivityExpression) -> Self {
        self.activity_type = expression.activity_type.clone();
        self.start_range = expression.start_range;
        self.end_range = expression.end_range;
        self.start_or_end_range = expression.start_or_end_range;
        self.start_or_end_windows = expression.start_or_end_windows.clone();
        self.duration_range = expression.duration_range;
        self.name_pattern = expression.name_pattern.as_ref().map(|p| p.as_str().to_owned());
        self.parameters = expression.parameters.clone();
        self
    }

    /// Bootstraps this builder from an existing instance's concrete
    /// properties.
    pub fn based_on_instance(mut self, act: &ActivityInstance) -> Self {
        self.activity_type = Some(act.activity_type().clone());
        if let Some(start) = act.start_time() {
            self.start_range = Some(Window::at(start));
        }
        if let Some(duration) = act.duration() {
            self.duration_range = Some(Window::at(duration));
        }
        self.name_pattern = Some(regex::escape(act.name()));
        self
    }

    /// Finishes the builder, compiling the name criterion.
    ///
    /// # Errors
    ///
    /// Fails if the name pattern is not a valid regular expression.
    pub fn build(self) -> Result<ActivityExpression> {
        let name_pattern = match self.name_pattern {
            Some(pattern) => Some(Regex::new(&format!("^(?:{pattern})$"))?),
            None => None,
        };
        Ok(ActivityExpression {
            activity_type: self.activity_type,
            start_range: self.start_range,
            end_range: self.end_range,
            start_or_end_range: self.start_or_end_range,
            start_or_end_windows: self.start_or_end_windows,
            duration_range: self.duration_range,
            name_pattern,
            parameters: self.parameters,
        })
    }
}
