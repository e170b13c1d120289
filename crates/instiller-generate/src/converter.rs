use instiller_core::{
    AliasStore, CompositeType, ScalarKind, SequenceKind, TypeExpr, TypeKind, TypeRegistry,
};
use regex::Regex;
use serde_json::{Map, Value};

use crate::errors::{GenerationError, Result};
use crate::generators::PluginRegistry;

/// Structural category the engine dispatches on.
#[derive(Debug, Clone, Copy)]
pub enum Category<'t> {
    Scalar(ScalarKind),
    Array(&'t TypeExpr),
    /// Concrete collection; `element` is `None` when no argument is declared.
    Sequence {
        kind: SequenceKind,
        element: Option<&'t TypeExpr>,
    },
    Map {
        key: Option<&'t TypeExpr>,
        value: Option<&'t TypeExpr>,
    },
    Enum {
        name: &'t str,
        constants: &'t [String],
    },
    /// Set whose elements are constants of an enum.
    EnumSet {
        name: &'t str,
        constants: &'t [String],
    },
    Polymorphic {
        name: &'t str,
        tagged: bool,
    },
    Composite {
        name: &'t str,
        composite: &'t CompositeType,
    },
    AliasStore,
}

/// Category of `ty`. Erased generic arguments count as text.
pub fn categorize<'t>(types: &'t TypeRegistry, ty: &'t TypeExpr) -> Result<Category<'t>> {
    let descriptor = match ty {
        TypeExpr::Unresolved => return Ok(Category::Scalar(ScalarKind::Text)),
        TypeExpr::Array(element) => return Ok(Category::Array(element)),
        TypeExpr::Named(_) | TypeExpr::Generic { .. } => types.resolve(ty)?,
    };

    let category = match &descriptor.kind {
        TypeKind::Scalar(kind) => Category::Scalar(*kind),
        TypeKind::Sequence(kind) => {
            let element = ty.type_arg(0);
            if *kind == SequenceKind::Set
                && let Some(element) = element
                && let Ok(element_type) = types.resolve(element)
                && let TypeKind::Enum { constants } = &element_type.kind
            {
                Category::EnumSet {
                    name: element_type.name.as_str(),
                    constants,
                }
            } else {
                Category::Sequence {
                    kind: *kind,
                    element,
                }
            }
        }
        TypeKind::Map => Category::Map {
            key: ty.type_arg(0),
            value: ty.type_arg(1),
        },
        TypeKind::Enum { constants } => Category::Enum {
            name: descriptor.name.as_str(),
            constants,
        },
        TypeKind::Abstract { tagged, .. } => Category::Polymorphic {
            name: descriptor.name.as_str(),
            tagged: *tagged,
        },
        TypeKind::Composite(composite) => Category::Composite {
            name: descriptor.name.as_str(),
            composite,
        },
        TypeKind::AliasStore => Category::AliasStore,
    };
    Ok(category)
}

/// A `$[GENERATOR('pattern','seed')]` expression found in persisted aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub generator: String,
    pub pattern: String,
    pub seed: String,
}

impl Placeholder {
    /// Parse `text` when it has the `$[...]` shape.
    ///
    /// Returns `Ok(None)` for plain text and `PlaceholderGrammar` when the
    /// brackets hold anything but a single two-argument invocation.
    pub fn parse(text: &str) -> Result<Option<Self>> {
        let candidate = text.trim();
        if !(candidate.starts_with("$[") && candidate.ends_with(']') && candidate.len() > 3) {
            return Ok(None);
        }

        let grammar = Regex::new(r"^\$\[\s*([A-Za-z_][A-Za-z0-9_]*)\s*\(\s*'([^']*)'\s*,\s*'([^']*)'\s*\)\s*\]$")
            .map_err(|err| GenerationError::Configuration(err.to_string()))?;
        let captures = grammar.captures(candidate).ok_or_else(|| {
            GenerationError::PlaceholderGrammar(format!(
                "'{candidate}' is not of the form $[GENERATOR('pattern','seed')]"
            ))
        })?;

        Ok(Some(Self {
            generator: captures[1].to_string(),
            pattern: captures[2].to_string(),
            seed: captures[3].to_string(),
        }))
    }

    /// Canonical text of the expression.
    pub fn render(&self) -> String {
        format!("$[{}('{}','{}')]", self.generator, self.pattern, self.seed)
    }

    /// Run the named plugin on the two arguments.
    pub fn evaluate(&self, plugins: &PluginRegistry) -> Result<String> {
        plugins.invoke(&self.generator, &self.pattern, &self.seed)
    }
}

/// Marshals alias stores and decodes persisted ones through the plugins.
#[derive(Debug, Clone, Copy)]
pub struct AliasConverter<'p> {
    plugins: &'p PluginRegistry,
}

impl<'p> AliasConverter<'p> {
    /// Converter evaluating placeholders with `plugins`.
    pub fn new(plugins: &'p PluginRegistry) -> Self {
        Self { plugins }
    }

    /// Build a store from a persisted alias node.
    ///
    /// Placeholder values are evaluated; any other value is taken literally.
    pub fn decode(&self, node: &Value) -> Result<AliasStore> {
        let mut store = AliasStore::new();
        let entries = match node {
            Value::Null => return Ok(store),
            Value::Object(entries) => entries,
            other => {
                return Err(GenerationError::PlaceholderGrammar(format!(
                    "alias node must be an object, got {other}"
                )));
            }
        };

        for (name, value) in entries {
            let text = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            let resolved = match Placeholder::parse(&text)? {
                Some(placeholder) => placeholder.evaluate(self.plugins)?,
                None => text,
            };
            store.insert(name.clone(), resolved);
        }
        Ok(store)
    }

    /// Alias node in insertion order.
    pub fn encode(&self, store: &AliasStore) -> Value {
        let entries: Map<String, Value> = store
            .iter()
            .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
            .collect();
        Value::Object(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_quoted_arguments() {
        let placeholder = Placeholder::parse("$[ NUMBER ( '1,5' , 'x' ) ]")
            .expect("parse")
            .expect("placeholder");
        assert_eq!(placeholder.generator, "NUMBER");
        assert_eq!(placeholder.pattern, "1,5");
        assert_eq!(placeholder.seed, "x");
        assert_eq!(placeholder.render(), "$[NUMBER('1,5','x')]");
    }

    #[test]
    fn plain_text_is_not_a_placeholder() {
        assert_eq!(Placeholder::parse("Lisbon").expect("parse"), None);
        assert_eq!(Placeholder::parse("$[").expect("parse"), None);
    }

    #[test]
    fn malformed_invocations_are_rejected() {
        for text in [
            "$[NUMBER]",
            "$[NUMBER('1,5')]",
            "$[NUMBER(1,5)]",
            "$[NUMBER('a','b') WORD('c','d')]",
        ] {
            assert!(
                matches!(
                    Placeholder::parse(text),
                    Err(GenerationError::PlaceholderGrammar(_))
                ),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn enum_sets_are_their_own_category() {
        let mut types = TypeRegistry::new();
        let color = types.enumeration("Color", &["Red", "Green"]);
        let set = TypeExpr::generic("BTreeSet", vec![color.clone()]);
        let list = TypeExpr::generic("Vec", vec![color]);

        assert!(matches!(
            categorize(&types, &set).expect("categorize"),
            Category::EnumSet { name: "Color", .. }
        ));
        assert!(matches!(
            categorize(&types, &list).expect("categorize"),
            Category::Sequence {
                kind: SequenceKind::List,
                ..
            }
        ));
    }
}
