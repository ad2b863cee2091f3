// src/store.rs

//! Key-value metadata store with ordered listing, pagination, and schema
//! validation.
//!
//! Every node and edge of a graph can lazily own one [`Store`]. Keys are
//! visited in ascending lexical order by `keys`, `list`, and `range`, which
//! is what makes snapshot encoding byte-stable.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Expected type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    Bytes,
    Slice,
    Map,
    Any,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Bytes => "bytes",
            FieldType::Slice => "slice",
            FieldType::Map => "map",
            FieldType::Any => "any",
        };
        f.write_str(name)
    }
}

/// Type and requirement for a single schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    #[serde(rename = "type")]
    pub kind: FieldType,
    #[serde(default)]
    pub required: bool,
}

/// Schema maps field names to their definitions.
pub type Schema = BTreeMap<String, FieldDef>;

/// A single violation reported by [`Store::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field {field:?}")]
    MissingRequired { field: String },

    #[error("field {field:?}: expected type {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        actual: &'static str,
    },
}

/// A key-value pair returned by [`Store::list`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub key: String,
    pub value: Value,
}

/// A paginated view of store entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub items: Vec<Entry>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
}

/// Ordered key-value store with an optional validation schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    entries: BTreeMap<String, Value>,
    schema: Option<Schema>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a key-value pair.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove a key. Returns true if the key existed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All keys in ascending lexical order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Paginated view of entries sorted by key.
    ///
    /// A `limit` of 0 means "all entries from `offset` onward". An `offset`
    /// past the end produces an empty page with `has_more = false`.
    pub fn list(&self, offset: usize, limit: usize) -> Page {
        let total = self.entries.len();
        let offset = offset.min(total);

        let selected: Vec<Entry> = self
            .entries
            .iter()
            .skip(offset)
            .take(if limit == 0 { usize::MAX } else { limit })
            .map(|(k, v)| Entry {
                key: k.clone(),
                value: v.clone(),
            })
            .collect();

        let has_more = offset + selected.len() < total;
        Page {
            items: selected,
            total,
            offset,
            limit,
            has_more,
        }
    }

    /// Visit entries in sorted key order. Iteration stops when `f` returns
    /// false.
    pub fn range(&self, mut f: impl FnMut(&str, &Value) -> bool) {
        for (k, v) in &self.entries {
            if !f(k, v) {
                return;
            }
        }
    }

    /// Attach a validation schema.
    pub fn set_schema(&mut self, schema: Schema) {
        self.schema = Some(schema);
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// Check all entries against the schema.
    ///
    /// Validation is open-world: keys not mentioned by the schema are always
    /// accepted. Every missing required field and every type mismatch is
    /// reported; an empty result means the store is valid (or has no schema).
    pub fn validate(&self) -> Vec<ValidationError> {
        let Some(schema) = &self.schema else {
            return Vec::new();
        };

        let mut errors = Vec::new();
        for (field, def) in schema {
            match self.entries.get(field) {
                None => {
                    if def.required {
                        errors.push(ValidationError::MissingRequired {
                            field: field.clone(),
                        });
                    }
                }
                Some(value) => {
                    if def.kind != FieldType::Any && !matches_type(value, def.kind) {
                        errors.push(ValidationError::TypeMismatch {
                            field: field.clone(),
                            expected: def.kind,
                            actual: value_type_name(value),
                        });
                    }
                }
            }
        }
        errors
    }

    pub(crate) fn entries(&self) -> &BTreeMap<String, Value> {
        &self.entries
    }
}

/// Whether a JSON value satisfies a declared field type.
///
/// Integers that survived a JSON round-trip still count as `int`; `bytes`
/// accepts any array of integers in `0..=255`.
fn matches_type(value: &Value, kind: FieldType) -> bool {
    match kind {
        FieldType::String => value.is_string(),
        FieldType::Int => value.as_i64().is_some() || value.as_u64().is_some(),
        FieldType::Float => value.is_f64(),
        FieldType::Bool => value.is_boolean(),
        FieldType::Bytes => value
            .as_array()
            .is_some_and(|items| items.iter().all(|v| v.as_u64().is_some_and(|b| b <= 255))),
        FieldType::Slice => value.is_array(),
        FieldType::Map => value.is_object(),
        FieldType::Any => true,
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
