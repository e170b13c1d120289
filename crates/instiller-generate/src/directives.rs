use std::collections::{BTreeMap, BTreeSet};

use instiller_core::{FieldKey, GenerationDirective, TypeRegistry};
use instiller_plan::{DirectiveLevel, DirectivePlan};
use tracing::debug;

use crate::errors::{GenerationError, Result};

/// Where the active directive of a field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveSource {
    Field,
    Class,
}

#[derive(Debug, Clone)]
struct Entry {
    directive: GenerationDirective,
    source: DirectiveSource,
}

/// Active directive per field, cumulative across runs.
///
/// Field level entries only fill empty slots. Class level entries always
/// replace what is there, so they win no matter the registration order.
#[derive(Debug, Default, Clone)]
pub struct DirectiveStore {
    entries: BTreeMap<FieldKey, Entry>,
    registered: BTreeSet<String>,
}

impl DirectiveStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a field level directive. Returns `false` when the field already
    /// had one, in which case `directive` is dropped.
    pub fn set_directive(
        &mut self,
        type_name: &str,
        field: &str,
        directive: GenerationDirective,
    ) -> bool {
        let key = FieldKey::new(type_name, field);
        if self.entries.contains_key(&key) {
            debug!(field = %key, "field directive ignored, one is already active");
            return false;
        }
        self.entries.insert(
            key,
            Entry {
                directive,
                source: DirectiveSource::Field,
            },
        );
        true
    }

    /// Record a class level directive, replacing any active one.
    pub fn set_class_directive(
        &mut self,
        type_name: &str,
        field: &str,
        directive: GenerationDirective,
    ) -> Result<()> {
        if field.trim().is_empty() {
            return Err(GenerationError::Configuration(format!(
                "class directive on '{type_name}' names no field"
            )));
        }
        self.entries.insert(
            FieldKey::new(type_name, field),
            Entry {
                directive,
                source: DirectiveSource::Class,
            },
        );
        Ok(())
    }

    /// Active directive of `key`, if any.
    pub fn get(&self, key: &FieldKey) -> Option<&GenerationDirective> {
        self.entries.get(key).map(|entry| &entry.directive)
    }

    /// Whether `key` has an active directive.
    pub fn contains(&self, key: &FieldKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether the active directive of `key` came from a class or a field.
    pub fn source(&self, key: &FieldKey) -> Option<DirectiveSource> {
        self.entries.get(key).map(|entry| entry.source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the declarations of `type_name` were already loaded.
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.registered.contains(type_name)
    }

    /// Load the declarations of composite `name` and its ancestors.
    ///
    /// Runs once per type; class directives go in before field directives.
    /// A type whose class directives are rejected stays unregistered, so
    /// every later run fails the same way.
    pub fn register_type(&mut self, types: &TypeRegistry, name: &str) -> Result<()> {
        for (type_name, composite) in types.composite_chain(name) {
            if self.registered.contains(type_name) {
                continue;
            }
            if let Some(blank) = composite
                .class_directives
                .iter()
                .find(|class_directive| class_directive.field.trim().is_empty())
            {
                let target = blank.target_type.as_deref().unwrap_or(type_name);
                return Err(GenerationError::Configuration(format!(
                    "class directive on '{target}' names no field"
                )));
            }
            for class_directive in &composite.class_directives {
                let target = class_directive.target_type.as_deref().unwrap_or(type_name);
                self.set_class_directive(
                    target,
                    &class_directive.field,
                    class_directive.directive.clone(),
                )?;
            }
            for field in &composite.fields {
                if let Some(directive) = &field.directive {
                    self.set_directive(type_name, &field.name, directive.clone());
                }
            }
            self.registered.insert(type_name.to_string());
            debug!(type_name, "directives registered");
        }
        Ok(())
    }

    /// Load a declarative plan with the same precedence rules.
    pub fn apply_plan(&mut self, plan: &DirectivePlan) -> Result<()> {
        for rule in &plan.directives {
            match rule.level {
                DirectiveLevel::Field => {
                    self.set_directive(&rule.type_name, &rule.field, rule.directive.clone());
                }
                DirectiveLevel::Class => {
                    self.set_class_directive(&rule.type_name, &rule.field, rule.directive.clone())?;
                }
            }
        }
        Ok(())
    }
}
