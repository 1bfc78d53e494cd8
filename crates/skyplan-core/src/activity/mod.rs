//! Activity model: types, instances, matching expressions and creation
//! templates.

mod expression;
mod instance;
mod template;
mod types;

pub use expression::{ActivityExpression, ActivityExpressionBuilder};
pub use instance::ActivityInstance;
pub use template::{
    ActivityCreationTemplate, ActivityCreationTemplateBuilder, ActivityCreationTemplateDisjunction,
};
pub use types::ActivityType;
