//! Activity type descriptors.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::constraints::StateConstraintExpression;
use crate::value::ValueKind;

/// The declared signature of a mission behavior: a name, an optional state
/// constraint every instance of the type must respect, and an optional
/// parameter schema.
///
/// Types are owned by the mission-model registry and looked up by name; the
/// scheduler never instantiates simulation logic from them.
#[derive(Debug, Clone)]
pub struct ActivityType {
    name: String,
    state_constraints: Option<Arc<StateConstraintExpression>>,
    schema: Option<BTreeMap<String, ValueKind>>,
}

impl ActivityType {
    /// Creates a type with no constraints and no parameter schema.
    pub fn new(name: impl Into<String>) -> ActivityType {
        ActivityType { name: name.into(), state_constraints: None, schema: None }
    }

    /// Attaches a state constraint that every instance must satisfy over its
    /// start window.
    pub fn with_state_constraints(mut self, constraints: Arc<StateConstraintExpression>) -> Self {
        self.state_constraints = Some(constraints);
        self
    }

    /// Attaches the declared parameter schema.
    pub fn with_schema(mut self, schema: BTreeMap<String, ValueKind>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state_constraints(&self) -> Option<&Arc<StateConstraintExpression>> {
        self.state_constraints.as_ref()
    }

    pub fn schema(&self) -> Option<&BTreeMap<String, ValueKind>> {
        self.schema.as_ref()
    }
}

impl PartialEq for ActivityType {
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name || self.schema != other.schema {
            return false;
        }
        match (&self.state_constraints, &other.state_constraints) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for ActivityType {}
