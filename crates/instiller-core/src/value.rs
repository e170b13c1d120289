use serde_json::{Map, Number, Value};

use crate::aliases::AliasStore;
use crate::error::{Error, Result};
use crate::types::ScalarKind;

/// Synthesized object graph, before it becomes a typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedValue {
    /// No value: recursion cutoff, skipped branch or unresolved type.
    Absent,
    Scalar {
        kind: ScalarKind,
        text: String,
    },
    /// Enum constant name.
    Enum(String),
    Array(Vec<GeneratedValue>),
    Sequence(Vec<GeneratedValue>),
    Map(Vec<(GeneratedValue, GeneratedValue)>),
    /// Concrete value standing in for an abstract type.
    Tagged {
        tag: String,
        value: Box<GeneratedValue>,
    },
    Object(Vec<(String, GeneratedValue)>),
    Aliases(AliasStore),
}

impl GeneratedValue {
    /// Scalar leaf holding `text`.
    pub fn text(kind: ScalarKind, text: impl Into<String>) -> Self {
        GeneratedValue::Scalar {
            kind,
            text: text.into(),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, GeneratedValue::Absent)
    }

    /// Text of scalar and enum leaves.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            GeneratedValue::Scalar { text, .. } => Some(text.as_str()),
            GeneratedValue::Enum(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Field value of an object.
    pub fn field(&self, name: &str) -> Option<&GeneratedValue> {
        match self {
            GeneratedValue::Object(fields) => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Replace (or append) an object field. Returns `false` for non-objects.
    pub fn set_field(&mut self, name: &str, value: GeneratedValue) -> bool {
        let GeneratedValue::Object(fields) = self else {
            return false;
        };
        match fields.iter_mut().find(|(field, _)| field == name) {
            Some((_, slot)) => *slot = value,
            None => fields.push((name.to_string(), value)),
        }
        true
    }

    /// Number of elements held by arrays, sequences and maps.
    pub fn len(&self) -> usize {
        match self {
            GeneratedValue::Array(items) | GeneratedValue::Sequence(items) => items.len(),
            GeneratedValue::Map(entries) => entries.len(),
            GeneratedValue::Object(fields) => fields.len(),
            GeneratedValue::Aliases(store) => store.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert into the serde data model.
    ///
    /// Scalar text is parsed according to its kind, absent object fields are
    /// omitted so `Option` and `#[serde(default)]` fields stay unset, and map
    /// keys are rendered as text.
    pub fn to_json(&self) -> Result<Value> {
        match self {
            GeneratedValue::Absent => Ok(Value::Null),
            GeneratedValue::Scalar { kind, text } => scalar_to_json(*kind, text),
            GeneratedValue::Enum(name) => Ok(Value::String(name.clone())),
            GeneratedValue::Array(items) | GeneratedValue::Sequence(items) => items
                .iter()
                .filter(|item| !item.is_absent())
                .map(GeneratedValue::to_json)
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            GeneratedValue::Map(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    if key.is_absent() || value.is_absent() {
                        continue;
                    }
                    map.insert(map_key(key)?, value.to_json()?);
                }
                Ok(Value::Object(map))
            }
            GeneratedValue::Tagged { tag, value } => {
                let mut map = Map::new();
                map.insert(tag.clone(), value.to_json()?);
                Ok(Value::Object(map))
            }
            GeneratedValue::Object(fields) => {
                let mut map = Map::new();
                for (name, value) in fields {
                    if value.is_absent() {
                        continue;
                    }
                    map.insert(name.clone(), value.to_json()?);
                }
                Ok(Value::Object(map))
            }
            GeneratedValue::Aliases(store) => Ok(Value::Object(
                store
                    .iter()
                    .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
                    .collect(),
            )),
        }
    }
}

fn scalar_to_json(kind: ScalarKind, text: &str) -> Result<Value> {
    match kind {
        ScalarKind::Bool => Ok(Value::Bool(text.trim().eq_ignore_ascii_case("true"))),
        ScalarKind::Char => text
            .chars()
            .next()
            .map(|c| Value::String(c.to_string()))
            .ok_or_else(|| Error::InvalidValue("empty text for char value".to_string())),
        ScalarKind::Integer => {
            let trimmed = text.trim();
            if let Ok(value) = trimmed.parse::<i64>() {
                return Ok(Value::Number(value.into()));
            }
            trimmed
                .parse::<u64>()
                .map(|value| Value::Number(value.into()))
                .map_err(|_| Error::InvalidValue(format!("'{text}' is not an integer")))
        }
        ScalarKind::Float => {
            let value = text
                .trim()
                .parse::<f64>()
                .map_err(|_| Error::InvalidValue(format!("'{text}' is not a number")))?;
            Number::from_f64(value)
                .map(Value::Number)
                .ok_or_else(|| Error::InvalidValue(format!("'{text}' is not a finite number")))
        }
        ScalarKind::Text | ScalarKind::Date { .. } => Ok(Value::String(text.to_string())),
    }
}

fn map_key(key: &GeneratedValue) -> Result<String> {
    match key {
        GeneratedValue::Scalar {
            kind: ScalarKind::Bool,
            text,
        } => Ok(text.trim().eq_ignore_ascii_case("true").to_string()),
        GeneratedValue::Scalar { text, .. } => Ok(text.clone()),
        GeneratedValue::Enum(name) => Ok(name.clone()),
        other => Err(Error::Unsupported(format!(
            "map keys must be scalars or enum constants, got {other:?}"
        ))),
    }
}
