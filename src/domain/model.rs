use crate::utils::error::{NestError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One flat result line: field name to opaque string value, in binding order.
///
/// An absent field (no key) is different from a field bound to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: IndexMap<String, String>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Present and non-empty.
    pub fn has_value(&self, field: &str) -> bool {
        self.get(field).is_some_and(|value| !value.is_empty())
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.fields.shift_remove(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Result of a conversion: `rootName` to the entries produced under it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Output {
    entries: IndexMap<String, Vec<Value>>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, root_name: &str) -> Option<&[Value]> {
        self.entries.get(root_name).map(Vec::as_slice)
    }

    pub fn contains_key(&self, root_name: &str) -> bool {
        self.entries.contains_key(root_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert(&mut self, root_name: &str, values: Vec<Value>) {
        self.entries.insert(root_name.to_string(), values);
    }

    pub(crate) fn push(&mut self, root_name: &str, value: Value) {
        self.entries
            .entry(root_name.to_string())
            .or_default()
            .push(value);
    }

    pub fn into_entries(self) -> IndexMap<String, Vec<Value>> {
        self.entries
    }

    pub fn into_json(self) -> Value {
        Value::Object(
            self.entries
                .into_iter()
                .map(|(k, v)| (k, Value::Array(v)))
                .collect(),
        )
    }
}

/// Builds one group object from disjoint parts: the discriminant, the
/// collected fields and the nested (or leaf) result.
#[derive(Debug)]
pub struct GroupEntry {
    root_name: String,
    fields: Map<String, Value>,
}

impl GroupEntry {
    pub fn new(root_name: &str, name: &str, discriminant: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(name.to_string(), Value::String(discriminant.into()));
        Self {
            root_name: root_name.to_string(),
            fields,
        }
    }

    pub fn field(mut self, key: &str, value: Value) -> Result<Self> {
        if self.fields.contains_key(key) {
            return Err(NestError::KeyCollision {
                key: key.to_string(),
                group: self.root_name,
            });
        }
        self.fields.insert(key.to_string(), value);
        Ok(self)
    }

    pub fn collected(self, collected: IndexMap<String, String>) -> Result<Self> {
        collected
            .into_iter()
            .try_fold(self, |entry, (k, v)| entry.field(&k, Value::String(v)))
    }

    pub fn nested(self, nested: Output) -> Result<Self> {
        nested
            .into_entries()
            .into_iter()
            .try_fold(self, |entry, (k, v)| entry.field(&k, Value::Array(v)))
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}
