use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Reference text written at every site sharing an alias.
pub fn alias_reference(name: &str) -> String {
    format!("${{{name}}}")
}

/// Ordered alias name -> generated text mapping.
///
/// A name is written at most once: later inserts for the same name keep the
/// first value. Iteration follows insertion order, which is also the order the
/// store is marshaled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasStore {
    entries: Vec<(String, String)>,
}

impl AliasStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of aliases held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Store `value` under `name` unless the name is already taken.
    ///
    /// Returns `true` when the entry was created.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.entries.push((name, value.into()));
        true
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Replace every `${name}` occurrence with the stored value.
    ///
    /// Unknown names and unterminated references are kept verbatim.
    pub fn resolve_references(&self, text: &str) -> String {
        let mut output = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("${") {
            output.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                output.push_str(&rest[start..]);
                return output;
            };
            let name = &after[..end];
            match self.get(name) {
                Some(value) => output.push_str(value),
                None => output.push_str(&rest[start..start + 2 + end + 1]),
            }
            rest = &after[end + 1..];
        }
        output.push_str(rest);
        output
    }
}

impl Serialize for AliasStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AliasStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AliasStoreVisitor)
    }
}

struct AliasStoreVisitor;

impl<'de> Visitor<'de> for AliasStoreVisitor {
    type Value = AliasStore;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of alias names to text values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut store = AliasStore::new();
        while let Some((name, value)) = access.next_entry::<String, String>()? {
            store.insert(name, value);
        }
        Ok(store)
    }
}
