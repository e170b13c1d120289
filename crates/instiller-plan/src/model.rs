use std::path::Path;

use instiller_core::GenerationDirective;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Plan document version understood by this crate.
pub const PLAN_VERSION: &str = "0.1";

/// Directives attached to described types from outside their declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DirectivePlan {
    /// Plan contract version.
    pub plan_version: String,
    /// Rules applied in document order.
    #[serde(default)]
    pub directives: Vec<DirectiveRule>,
}

impl DirectivePlan {
    /// Plan at the current version.
    pub fn new(directives: Vec<DirectiveRule>) -> Self {
        Self {
            plan_version: PLAN_VERSION.to_string(),
            directives,
        }
    }

    /// Parse a plan without validating it.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a plan file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// One directive bound to a field of a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DirectiveRule {
    /// Declaring type of the field.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Field name within the declaring type.
    pub field: String,
    /// Precedence of the rule when the field already has a directive.
    #[serde(default)]
    pub level: DirectiveLevel,
    #[serde(flatten)]
    pub directive: GenerationDirective,
}

impl DirectiveRule {
    /// Field-level rule.
    pub fn field(
        type_name: impl Into<String>,
        field: impl Into<String>,
        directive: GenerationDirective,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            field: field.into(),
            level: DirectiveLevel::Field,
            directive,
        }
    }

    /// Class-level rule, overriding field-level ones.
    pub fn class(
        type_name: impl Into<String>,
        field: impl Into<String>,
        directive: GenerationDirective,
    ) -> Self {
        Self {
            level: DirectiveLevel::Class,
            ..Self::field(type_name, field, directive)
        }
    }
}

/// Field rules only fill gaps; class rules replace whatever is registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveLevel {
    #[default]
    Field,
    Class,
}
