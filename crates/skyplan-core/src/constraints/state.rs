//! State constraint expressions.
//!
//! A state constraint narrows a window set to the times where a predicate
//! over a simulated resource holds. Expressions compose as conjunctions and
//! disjunctions; every evaluation returns a subset of its input windows, so
//! callers can narrow iteratively and stop as soon as a set runs empty.

use std::cell::RefCell;
use std::sync::Arc;

use crate::error::{ModelError, Result};
use crate::plan::Plan;
use crate::states::ExternalState;
use crate::value::Value;
use crate::windows::{TimeWindows, Window};

use super::cache::ValidityCache;

/// The predicate a leaf constraint applies to a resource's value.
#[derive(Debug, Clone)]
pub enum ValuePredicate {
    Above(Value),
    Below(Value),
    Between(Value, Value),
    Equal(Value),
    NotEqual(Value),
}

/// A leaf constraint: one predicate over one external state, with an
/// optional restriction of the times it may ever be satisfied in, and a
/// private memo of everything it has already evaluated.
#[derive(Debug)]
pub struct StateComparison {
    state: Arc<dyn ExternalState>,
    predicate: ValuePredicate,
    time_domain: Option<TimeWindows>,
    // One cache per constraint instance; queries mutate it. The solver is
    // single-threaded, so interior mutability is confined to one call stack.
    cache: RefCell<ValidityCache>,
}

impl StateComparison {
    pub fn new(state: Arc<dyn ExternalState>, predicate: ValuePredicate) -> StateComparison {
        StateComparison {
            state,
            predicate,
            time_domain: None,
            cache: RefCell::new(ValidityCache::new()),
        }
    }

    /// Restricts satisfaction to the given time domain.
    pub fn restricted_to(mut self, time_domain: TimeWindows) -> StateComparison {
        self.time_domain = Some(time_domain);
        self
    }

    fn fetch(&self, span: &Window) -> Result<TimeWindows> {
        let span_set = TimeWindows::of(*span);
        match &self.predicate {
            ValuePredicate::Above(value) => self.state.when_value_above(value, &span_set),
            ValuePredicate::Below(value) => self.state.when_value_below(value, &span_set),
            ValuePredicate::Between(low, high) => {
                self.state.when_value_between(low, high, &span_set)
            }
            ValuePredicate::Equal(value) => self.state.when_value_equal(value, &span_set),
            ValuePredicate::NotEqual(value) => self.state.when_value_not_equal(value, &span_set),
        }
    }

    fn find_windows(&self, windows: &TimeWindows) -> Result<TimeWindows> {
        let mut result = TimeWindows::new();
        let mut cache = self.cache.borrow_mut();
        for window in windows.iter() {
            let mut fetch = |span: &Window| self.fetch(span);
            let satisfied = cache.find_windows(&window, &mut fetch)?;
            result.union_all(&satisfied);
        }
        drop(cache);
        if let Some(domain) = &self.time_domain {
            result.intersection(domain, false);
        }
        Ok(result)
    }
}

/// A state constraint: a leaf predicate, or an and/or combination of
/// sub-constraints.
#[derive(Debug)]
pub enum StateConstraintExpression {
    Leaf(StateComparison),
    And(Vec<StateConstraintExpression>),
    Or(Vec<StateConstraintExpression>),
}

impl StateConstraintExpression {
    pub fn above(state: Arc<dyn ExternalState>, value: Value) -> StateConstraintExpression {
        StateConstraintExpression::Leaf(StateComparison::new(state, ValuePredicate::Above(value)))
    }

    pub fn below(state: Arc<dyn ExternalState>, value: Value) -> StateConstraintExpression {
        StateConstraintExpression::Leaf(StateComparison::new(state, ValuePredicate::Below(value)))
    }

    pub fn between(
        state: Arc<dyn ExternalState>,
        low: Value,
        high: Value,
    ) -> StateConstraintExpression {
        StateConstraintExpression::Leaf(StateComparison::new(
            state,
            ValuePredicate::Between(low, high),
        ))
    }

    pub fn equal(state: Arc<dyn ExternalState>, value: Value) -> StateConstraintExpression {
        StateConstraintExpression::Leaf(StateComparison::new(state, ValuePredicate::Equal(value)))
    }

    pub fn not_equal(state: Arc<dyn ExternalState>, value: Value) -> StateConstraintExpression {
        StateConstraintExpression::Leaf(StateComparison::new(
            state,
            ValuePredicate::NotEqual(value),
        ))
    }

    pub fn builder() -> StateConstraintExpressionBuilder {
        StateConstraintExpressionBuilder::default()
    }

    /// The subset of `windows` over which this constraint is satisfied in
    /// the context of the given plan.
    ///
    /// The result is always a subset of the input: conjunctions narrow
    /// sequentially and short-circuit once the set runs empty, disjunctions
    /// union their members' results.
    pub fn find_windows(&self, plan: &Plan, windows: &TimeWindows) -> Result<TimeWindows> {
        match self {
            StateConstraintExpression::Leaf(leaf) => leaf.find_windows(windows),
            StateConstraintExpression::And(members) => {
                let mut remaining = windows.clone();
                for member in members {
                    remaining = member.find_windows(plan, &remaining)?;
                    if remaining.is_empty() {
                        break;
                    }
                }
                Ok(remaining)
            }
            StateConstraintExpression::Or(members) => {
                let mut result = TimeWindows::new();
                for member in members {
                    result.union_all(&member.find_windows(plan, windows)?);
                }
                Ok(result)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CombinationMode {
    And,
    Or,
}

/// Fluent builder for [`StateConstraintExpression`].
///
/// Chained predicate terms collect into one combination; the mode must be
/// chosen explicitly with [`and_combination`](Self::and_combination) or
/// [`or_combination`](Self::or_combination) unless only a single term is
/// given. All misuses are reported by `build()`, never silently defaulted.
#[derive(Debug, Default)]
pub struct StateConstraintExpressionBuilder {
    mode: Option<CombinationMode>,
    mode_conflict: bool,
    members: Vec<StateConstraintExpression>,
}

impl StateConstraintExpressionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Combines the collected terms as a conjunction.
    pub fn and_combination(mut self) -> Self {
        if self.mode.is_some() {
            self.mode_conflict = true;
        }
        self.mode = Some(CombinationMode::And);
        self
    }

    /// Combines the collected terms as a disjunction.
    pub fn or_combination(mut self) -> Self {
        if self.mode.is_some() {
            self.mode_conflict = true;
        }
        self.mode = Some(CombinationMode::Or);
        self
    }

    /// Adds an already-built constraint as a member.
    pub fn satisfied(mut self, expression: StateConstraintExpression) -> Self {
        self.members.push(expression);
        self
    }

    pub fn above(mut self, state: Arc<dyn ExternalState>, value: Value) -> Self {
        self.members.push(StateConstraintExpression::above(state, value));
        self
    }

    pub fn below(mut self, state: Arc<dyn ExternalState>, value: Value) -> Self {
        self.members.push(StateConstraintExpression::below(state, value));
        self
    }

    pub fn between(mut self, state: Arc<dyn ExternalState>, low: Value, high: Value) -> Self {
        self.members.push(StateConstraintExpression::between(state, low, high));
        self
    }

    pub fn equal(mut self, state: Arc<dyn ExternalState>, value: Value) -> Self {
        self.members.push(StateConstraintExpression::equal(state, value));
        self
    }

    pub fn not_equal(mut self, state: Arc<dyn ExternalState>, value: Value) -> Self {
        self.members.push(StateConstraintExpression::not_equal(state, value));
        self
    }

    /// Finishes the builder.
    ///
    /// # Errors
    ///
    /// Fails if no member was added, the combination mode was set twice, or
    /// several members were collected without choosing a mode.
    pub fn build(self) -> Result<StateConstraintExpression> {
        if self.mode_conflict {
            return Err(ModelError::BuilderModeAlreadySet);
        }
        if self.members.is_empty() {
            return Err(ModelError::EmptyConstraintSet);
        }
        match (self.mode, self.members.len()) {
            (Some(CombinationMode::And), _) => Ok(StateConstraintExpression::And(self.members)),
            (Some(CombinationMode::Or), _) => Ok(StateConstraintExpression::Or(self.members)),
            (None, 1) => {
                let mut members = self.members;
                Ok(members.remove(0))
            }
            (None, _) => Err(ModelError::MissingBuilderMode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Duration;

    /// A state that is `Int(1)` inside its listed windows and `Int(0)`
    /// elsewhere.
    #[derive(Debug)]
    struct FlagState {
        high: TimeWindows,
    }

    impl ExternalState for FlagState {
        fn value_at(&self, time: Duration) -> Option<Value> {
            Some(Value::Int(if self.high.contains(time) { 1 } else { 0 }))
        }

        fn when_value_above(&self, value: &Value, windows: &TimeWindows) -> Result<TimeWindows> {
            match value {
                Value::Int(v) if *v < 1 => {
                    let mut out = self.high.clone();
                    out.intersection(windows, false);
                    Ok(out)
                }
                Value::Int(_) => Ok(TimeWindows::new()),
                other => Err(ModelError::ValueTypeMismatch {
                    expected: crate::value::ValueKind::Int,
                    found: other.kind(),
                }),
            }
        }

        fn when_value_below(&self, value: &Value, windows: &TimeWindows) -> Result<TimeWindows> {
            match value {
                Value::Int(v) if *v > 0 => {
                    let mut out = windows.clone();
                    if *v <= 1 {
                        out.subtract(&self.high);
                    }
                    Ok(out)
                }
                Value::Int(_) => Ok(TimeWindows::new()),
                other => Err(ModelError::ValueTypeMismatch {
                    expected: crate::value::ValueKind::Int,
                    found: other.kind(),
                }),
            }
        }

        fn when_value_between(
            &self,
            low: &Value,
            _high: &Value,
            windows: &TimeWindows,
        ) -> Result<TimeWindows> {
            self.when_value_above(&Value::Int(match low {
                Value::Int(v) => *v - 1,
                _ => 0,
            }), windows)
        }

        fn when_value_equal(&self, value: &Value, windows: &TimeWindows) -> Result<TimeWindows> {
            match value {
                Value::Int(1) => {
                    let mut out = self.high.clone();
                    out.intersection(windows, false);
                    Ok(out)
                }
                Value::Int(0) => {
                    let mut out = windows.clone();
                    out.subtract(&self.high);
                    Ok(out)
                }
                _ => Ok(TimeWindows::new()),
            }
        }

        fn when_value_not_equal(&self, value: &Value, windows: &TimeWindows) -> Result<TimeWindows> {
            self.when_value_equal(
                &Value::Int(match value {
                    Value::Int(1) => 0,
                    _ => 1,
                }),
                windows,
            )
        }
    }

    fn seconds(s: i64) -> Duration {
        Duration::of_seconds(s)
    }

    fn window(a: i64, b: i64) -> Window {
        Window::between(seconds(a), seconds(b)).unwrap()
    }

    fn flag(windows: &[Window]) -> Arc<dyn ExternalState> {
        Arc::new(FlagState { high: TimeWindows::of_all(windows.iter().copied()) })
    }

    #[test]
    fn find_windows_narrows_monotonically() {
        let state = flag(&[window(10, 20), window(40, 50)]);
        let constraint = StateConstraintExpression::equal(state, Value::Int(1));
        let plan = Plan::new();
        let input = TimeWindows::of(window(0, 45));

        let found = constraint.find_windows(&plan, &input).unwrap();
        assert_eq!(found, TimeWindows::of_all([window(10, 20), window(40, 45)]));

        // Subset of the input.
        let mut recheck = found.clone();
        recheck.intersection(&input, false);
        assert_eq!(recheck, found);
    }

    #[test]
    fn repeated_queries_return_identical_results() {
        let state = flag(&[window(10, 20)]);
        let constraint = StateConstraintExpression::equal(state, Value::Int(1));
        let plan = Plan::new();
        let input = TimeWindows::of(window(0, 30));

        let first = constraint.find_windows(&plan, &input).unwrap();
        let second = constraint.find_windows(&plan, &input).unwrap();
        let third = constraint.find_windows(&plan, &input).unwrap();
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn conjunction_narrows_sequentially() {
        let a = flag(&[window(0, 30)]);
        let b = flag(&[window(20, 50)]);
        let constraint = StateConstraintExpression::builder()
            .and_combination()
            .equal(a, Value::Int(1))
            .equal(b, Value::Int(1))
            .build()
            .unwrap();

        let plan = Plan::new();
        let found = constraint.find_windows(&plan, &TimeWindows::of(window(0, 100))).unwrap();
        assert_eq!(found, TimeWindows::of(window(20, 30)));
    }

    #[test]
    fn disjunction_unions_member_results() {
        let a = flag(&[window(0, 10)]);
        let b = flag(&[window(20, 30)]);
        let constraint = StateConstraintExpression::builder()
            .or_combination()
            .equal(a, Value::Int(1))
            .equal(b, Value::Int(1))
            .build()
            .unwrap();

        let plan = Plan::new();
        let found = constraint.find_windows(&plan, &TimeWindows::of(window(0, 100))).unwrap();
        assert_eq!(found, TimeWindows::of_all([window(0, 10), window(20, 30)]));
    }

    #[test]
    fn builder_misuse_fails_at_build() {
        assert!(matches!(
            StateConstraintExpressionBuilder::new().build().unwrap_err(),
            ModelError::EmptyConstraintSet
        ));

        let a = flag(&[window(0, 10)]);
        let b = flag(&[window(0, 10)]);
        assert!(matches!(
            StateConstraintExpressionBuilder::new()
                .equal(a, Value::Int(1))
                .equal(b, Value::Int(1))
                .build()
                .unwrap_err(),
            ModelError::MissingBuilderMode
        ));

        let c = flag(&[window(0, 10)]);
        assert!(matches!(
            StateConstraintExpressionBuilder::new()
                .and_combination()
                .or_combination()
                .equal(c, Value::Int(1))
                .build()
                .unwrap_err(),
            ModelError::BuilderModeAlreadySet
        ));
    }
}
