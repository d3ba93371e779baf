//! Typed field extraction from untyped JSON documents
//!
//! Every legacy document is decoded once into a [`RawItem`] and then read
//! field by field. This is the only place where untyped JSON turns into typed
//! values: an absent key (or `null`) reads as the empty value, a key with the
//! wrong shape is a [`DeserializeError`] naming the field. Nothing here logs;
//! callers decide whether a failure is fatal.

use serde_json::{Map, Value};
use thiserror::Error;

/// Field name reported when the document itself cannot be decoded
pub const DOCUMENT_FIELD: &str = "<document>";

/// Shape mismatch while extracting a typed field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("deserialize error: {field}: {reason}")]
pub struct DeserializeError {
    /// Name of the offending field
    pub field: String,
    /// Human-readable cause
    pub reason: String,
}

impl DeserializeError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Untyped key/value mapping decoded from one JSON document
#[derive(Debug, Clone, Default)]
pub struct RawItem {
    fields: Map<String, Value>,
}

impl RawItem {
    /// Decode a JSON object
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DeserializeError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| DeserializeError::new(DOCUMENT_FIELD, e.to_string()))?;

        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(DeserializeError::new(
                DOCUMENT_FIELD,
                format!("expected a JSON object, found {}", json_kind(&other)),
            )),
        }
    }

    /// Whether the key is present with a non-null value
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Extract a single string; absent reads as ""
    pub fn string(&self, name: &str) -> Result<String, DeserializeError> {
        match self.get(name) {
            None => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(DeserializeError::new(
                name,
                format!("{} is not a string (found {})", name, json_kind(other)),
            )),
        }
    }

    /// Extract the first element of a string array; absent or empty reads as ""
    ///
    /// The whole array is validated, so a non-string element anywhere fails.
    pub fn first_string(&self, name: &str) -> Result<String, DeserializeError> {
        Ok(self.string_array(name)?.into_iter().next().unwrap_or_default())
    }

    /// Extract an array of strings; absent reads as an empty vector
    pub fn string_array(&self, name: &str) -> Result<Vec<String>, DeserializeError> {
        let elements = match self.get(name) {
            None => return Ok(Vec::new()),
            Some(Value::Array(elements)) => elements,
            Some(other) => {
                return Err(DeserializeError::new(
                    name,
                    format!("{} is not an array (found {})", name, json_kind(other)),
                ))
            }
        };

        elements
            .iter()
            .map(|element| match element {
                Value::String(s) => Ok(s.clone()),
                other => Err(DeserializeError::new(
                    name,
                    format!(
                        "{} array element is not a string (found {})",
                        name,
                        json_kind(other)
                    ),
                )),
            })
            .collect()
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
