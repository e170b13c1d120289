use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Per-field instruction describing how to synthesize the field's value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationDirective {
    /// Literal seed; the value itself when no generator is bound.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    /// Name of the generator plugin producing the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    /// Pattern handed to the generator plugin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Alias under which the value is shared with other fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Array length override; zero keeps the configured default.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub cardinality: usize,
    /// Candidate concrete types for abstract fields, tried in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implementations: Vec<String>,
    /// Leave the field untouched.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip: bool,
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

impl GenerationDirective {
    /// Directive producing a literal value.
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    /// Directive delegating to a generator plugin.
    pub fn generator(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            generator: Some(name.into()),
            pattern: Some(pattern.into()),
            ..Self::default()
        }
    }

    /// Directive excluding the field from generation.
    pub fn skipped() -> Self {
        Self {
            skip: true,
            ..Self::default()
        }
    }

    /// Seed text; passed to the plugin as its second argument.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Share the value with every field naming the same alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Element count for array fields; `0` keeps the default.
    pub fn with_cardinality(mut self, cardinality: usize) -> Self {
        self.cardinality = cardinality;
        self
    }

    /// Concrete candidates for an abstract field, tried in order.
    pub fn with_implementations<I, S>(mut self, implementations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.implementations = implementations.into_iter().map(Into::into).collect();
        self
    }
}

/// Class-level directive entry, possibly retrofitting a field of another type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDirective {
    /// Declaring type of the target field; `None` means the annotated type.
    pub target_type: Option<String>,
    pub field: String,
    pub directive: GenerationDirective,
}

impl ClassDirective {
    /// Directive for `field` of the annotated type.
    pub fn new(field: impl Into<String>, directive: GenerationDirective) -> Self {
        Self {
            target_type: None,
            field: field.into(),
            directive,
        }
    }

    /// Directive for `field` of another type, such as an ancestor.
    pub fn targeting(
        target_type: impl Into<String>,
        field: impl Into<String>,
        directive: GenerationDirective,
    ) -> Self {
        Self {
            target_type: Some(target_type.into()),
            field: field.into(),
            directive,
        }
    }
}
