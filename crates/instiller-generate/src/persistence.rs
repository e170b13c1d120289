//! Saving fixtures as JSON and loading them back with alias decoding.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use instiller_core::{AliasStore, Fixture, TypeExpr, TypeRegistry};

use crate::converter::{AliasConverter, Category, categorize};
use crate::engine::FixtureGenerator;
use crate::errors::Result;

/// Pretty JSON for `value`.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Load a `T` saved with [`to_json`].
///
/// Every alias store node in the document, nested ones included, is decoded
/// first, evaluating any `$[GENERATOR('pattern','seed')]` placeholder through
/// the generator's plugins. With `resolve_aliases` every `${name}` reference
/// in the document is replaced by its value and the alias nodes are dropped,
/// so alias store fields need `#[serde(default)]`. Otherwise the decoded
/// stores are written back in place.
pub fn from_json<T>(generator: &mut FixtureGenerator, text: &str, resolve_aliases: bool) -> Result<T>
where
    T: Fixture + DeserializeOwned,
{
    let mut document: Value = serde_json::from_str(text)?;
    let root = generator.types_mut().describe::<T>();

    let mut decoder = AliasDecoder {
        types: generator.types(),
        converter: AliasConverter::new(generator.plugins()),
        resolve_aliases,
        merged: AliasStore::new(),
        stores: 0,
    };
    decoder.visit(&root, &mut document)?;
    debug!(stores = decoder.stores, "alias nodes decoded");

    if resolve_aliases {
        debug!(aliases = decoder.merged.len(), "alias references resolved");
        substitute_references(&mut document, &decoder.merged);
    }

    Ok(serde_json::from_value(document)?)
}

/// Walks a document alongside its type description and decodes alias nodes.
struct AliasDecoder<'a> {
    types: &'a TypeRegistry,
    converter: AliasConverter<'a>,
    resolve_aliases: bool,
    /// Aliases of every decoded store, first writer wins.
    merged: AliasStore,
    stores: usize,
}

impl AliasDecoder<'_> {
    fn visit(&mut self, ty: &TypeExpr, node: &mut Value) -> Result<()> {
        if node.is_null() {
            return Ok(());
        }
        match categorize(self.types, ty)? {
            Category::AliasStore => {
                let store = self.converter.decode(node)?;
                self.stores += 1;
                if self.resolve_aliases {
                    for (name, value) in store.iter() {
                        self.merged.insert(name, value);
                    }
                }
                *node = self.converter.encode(&store);
            }
            Category::Composite { name, .. } => self.visit_composite(name, node)?,
            Category::Array(element)
            | Category::Sequence {
                element: Some(element),
                ..
            } => self.visit_items(element, node)?,
            Category::Map {
                value: Some(value), ..
            } => self.visit_values(value, node)?,
            Category::Polymorphic { tagged: true, .. } => {
                if let Value::Object(entries) = node
                    && entries.len() == 1
                {
                    for (tag, item) in entries.iter_mut() {
                        if self.types.contains(tag) {
                            self.visit(&ty.with_base(tag), item)?;
                        }
                    }
                }
            }
            // Untagged abstractions are the std collection families.
            Category::Polymorphic { tagged: false, .. } => {
                if node.is_array() {
                    if let Some(element) = ty.type_arg(0) {
                        self.visit_items(element, node)?;
                    }
                } else if let Some(value) = ty.type_arg(1) {
                    self.visit_values(value, node)?;
                }
            }
            Category::Scalar(_)
            | Category::Enum { .. }
            | Category::EnumSet { .. }
            | Category::Sequence { element: None, .. }
            | Category::Map { value: None, .. } => {}
        }
        Ok(())
    }

    fn visit_composite(&mut self, name: &str, node: &mut Value) -> Result<()> {
        let Value::Object(entries) = node else {
            return Ok(());
        };
        let types = self.types;
        for (_, composite) in types.composite_chain(name) {
            for field in &composite.fields {
                if field.is_static || field.omitted {
                    continue;
                }
                let Some(item) = entries.get_mut(&field.name) else {
                    continue;
                };
                self.visit(&field.ty, item)?;
                if self.resolve_aliases
                    && matches!(categorize(types, &field.ty), Ok(Category::AliasStore))
                {
                    entries.remove(&field.name);
                }
            }
        }
        Ok(())
    }

    fn visit_items(&mut self, element: &TypeExpr, node: &mut Value) -> Result<()> {
        if let Value::Array(items) = node {
            for item in items {
                self.visit(element, item)?;
            }
        }
        Ok(())
    }

    fn visit_values(&mut self, value: &TypeExpr, node: &mut Value) -> Result<()> {
        if let Value::Object(entries) = node {
            for (_, item) in entries.iter_mut() {
                self.visit(value, item)?;
            }
        }
        Ok(())
    }
}

fn substitute_references(value: &mut Value, aliases: &AliasStore) {
    match value {
        Value::String(text) => {
            if text.contains("${") {
                *text = aliases.resolve_references(text);
            }
        }
        Value::Array(items) => {
            for item in items {
                substitute_references(item, aliases);
            }
        }
        Value::Object(entries) => {
            for (_, item) in entries.iter_mut() {
                substitute_references(item, aliases);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
