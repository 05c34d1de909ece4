//! Flat record model and raw payload classification.
//!
//! Ownership model:
//! - `Record` is the single flat field-map shape shared by the normalizer,
//!   merge engine, store, and notifier.
//! - `RawPayload` tags the shapes a fetch can produce so downstream
//!   dispatch is explicit rather than ad hoc value inspection.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{fetch, fields};
use crate::types::{FieldName, FieldValue};

/// One disclosure filing as a flat, order-preserving field map.
///
/// The only required field is the upload-detail identifier; every other
/// field is best-effort and unknown fields are preserved verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<FieldName, FieldValue>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the identity key when present and non-empty.
    pub fn identity_key(&self) -> Option<&str> {
        self.fields
            .get(fields::IDENTITY_KEY)
            .map(String::as_str)
            .filter(|key| !key.is_empty())
    }

    /// Return the value stored under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Insert or replace the value stored under `name`.
    pub fn insert(&mut self, name: impl Into<FieldName>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldName, &FieldValue)> {
        self.fields.iter()
    }

    /// Number of fields carried by this record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a record from a JSON object, flattening values to strings.
    ///
    /// Scalars keep their natural string form; nested arrays/objects are
    /// flattened to compact JSON text so no field is dropped.
    pub fn from_object(object: &serde_json::Map<String, Value>) -> Self {
        let mut record = Record::new();
        for (name, value) in object {
            record.insert(name.clone(), flatten_value(value));
        }
        record
    }
}

impl FromIterator<(FieldName, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (FieldName, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Render a JSON value as a flat field string.
pub fn flatten_value(value: &Value) -> FieldValue {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        nested => nested.to_string(),
    }
}

/// Tagged shape of one raw fetch payload.
#[derive(Clone, Debug, PartialEq)]
pub enum RawPayload {
    /// Array-of-arrays rows mapped positionally by the normalizer.
    Tabular(Vec<Vec<Value>>),
    /// List of object-shaped records taken verbatim.
    Wrapped(Vec<Value>),
    /// A single object-shaped record.
    Single(serde_json::Map<String, Value>),
    /// Unparseable or free text; never guess-parsed.
    Opaque(String),
}

impl RawPayload {
    /// Classify a parsed JSON value into its payload shape.
    ///
    /// Objects are unwrapped through the first known wrapper field
    /// (`aaData`, then `data`) holding an array; an object with no
    /// wrapper is a single record. Lists become `Tabular` only when
    /// every element is itself an array.
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Object(object) => {
                for wrapper in fetch::WRAPPER_FIELDS {
                    if let Some(Value::Array(items)) = object.get(wrapper) {
                        return Self::classify_list(items.clone());
                    }
                }
                RawPayload::Single(object)
            }
            Value::Array(items) => Self::classify_list(items),
            Value::String(text) => RawPayload::Opaque(text),
            other => RawPayload::Opaque(other.to_string()),
        }
    }

    /// Classify a payload body, falling back to opaque text when it is
    /// not valid JSON.
    pub fn from_text(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::classify(value),
            Err(_) => RawPayload::Opaque(body.to_string()),
        }
    }

    fn classify_list(items: Vec<Value>) -> Self {
        let all_rows = !items.is_empty() && items.iter().all(Value::is_array);
        if all_rows {
            let rows = items
                .into_iter()
                .map(|row| match row {
                    Value::Array(cells) => cells,
                    _ => unreachable!("checked by all_rows"),
                })
                .collect();
            RawPayload::Tabular(rows)
        } else {
            RawPayload::Wrapped(items)
        }
    }
}
