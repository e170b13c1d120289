//! Declarative directive plans and their validation.
//!
//! A plan is a JSON document that attaches generation directives to fields of
//! described types without touching the types themselves.

pub mod errors;
pub mod model;
pub mod schema;
pub mod validate;

pub use errors::{IssueSeverity, PlanError, Result, ValidationIssue, ValidationReport};
pub use model::{DirectiveLevel, DirectivePlan, DirectiveRule, PLAN_VERSION};
pub use schema::plan_json_schema;
pub use validate::{ValidatedPlan, validate_plan, validate_plan_against_types, validate_plan_json};
