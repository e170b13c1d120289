use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::model::DirectivePlan;

/// Emit the JSON Schema for directive plan documents.
pub fn plan_json_schema() -> RootSchema {
    schema_for!(DirectivePlan)
}
