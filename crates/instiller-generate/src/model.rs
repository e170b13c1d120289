use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Knobs shared by every run of a [`FixtureGenerator`](crate::FixtureGenerator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// How many times a composite type may re-enter its own construction.
    pub recursion_level: usize,
    /// Element count for arrays without a cardinality and for collections.
    pub default_cardinality: usize,
    /// Seed for the built-in plugins; unset means entropy.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            recursion_level: 0,
            default_cardinality: 3,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Non-fatal problem met during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationIssue {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

impl GenerationIssue {
    /// Create a new issue without field or type context.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            field: None,
            type_name: None,
        }
    }

    /// Attach the field identity, when known.
    pub fn with_field(mut self, field: Option<String>) -> Self {
        self.field = field;
        self
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }
}

/// Summary of one top-level generation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureReport {
    pub run_id: String,
    pub root_type: String,
    pub generator_usage: BTreeMap<String, u64>,
    pub aliases_created: u64,
    pub recursion_cutoffs: BTreeMap<String, u64>,
    /// Times each composite-typed field was entered.
    pub composite_entries: BTreeMap<String, u64>,
    pub warnings_by_code: BTreeMap<String, u64>,
    pub warnings: Vec<GenerationIssue>,
}

impl FixtureReport {
    /// Empty report for run `run_id`.
    pub fn new(run_id: String, root_type: String) -> Self {
        Self {
            run_id,
            root_type,
            ..Self::default()
        }
    }

    pub fn record_generator_usage(&mut self, name: &str) {
        *self.generator_usage.entry(name.to_string()).or_insert(0) += 1;
    }

    pub fn record_alias(&mut self) {
        self.aliases_created += 1;
    }

    /// Count a field left absent by the recursion guard.
    pub fn record_cutoff(&mut self, field: &str) {
        *self.recursion_cutoffs.entry(field.to_string()).or_insert(0) += 1;
    }

    /// Record `issue` and count it under its code.
    pub fn record_warning(&mut self, issue: GenerationIssue) {
        *self.warnings_by_code.entry(issue.code.clone()).or_insert(0) += 1;
        self.warnings.push(issue);
    }

    /// Whether a warning with `code` was recorded.
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings_by_code.contains_key(code)
    }
}
