//! Canonical record model
//!
//! A [`CanonicalRecord`] is the unit handed to the object store. It owns all
//! of its parts by value and is built in one step once an item has been
//! fully normalized.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Media type of serialized domain metadata
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Flat string→string fields
///
/// Empty values are never stored: absence is the "no value" representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fields every new object starts with
    pub fn with_defaults() -> Self {
        let mut fields = Self::new();
        fields.set("draft", "false");
        fields
    }

    /// Set a field; empty values are ignored
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.0.insert(key.to_string(), value);
        }
    }

    /// Overlay `other` on top of these fields (other wins)
    pub fn merge(&mut self, other: FieldMap) {
        self.0.extend(other.0);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Serialized domain metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataPayload {
    pub media_type: String,
    pub payload: Vec<u8>,
}

impl MetadataPayload {
    /// Serialize a value as JSON
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            media_type: JSON_MEDIA_TYPE.to_string(),
            payload: serde_json::to_vec(value)?,
        })
    }
}

/// A file attached to a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Declared name, trimmed
    pub name: String,
    /// Sniffed from content, never taken from the descriptor
    pub media_type: String,
    pub content: Vec<u8>,
    /// Left unset; the store assigns its own timestamps
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl Attachment {
    pub fn new(name: &str, media_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.trim().to_string(),
            media_type: media_type.into(),
            content,
            created: None,
            modified: None,
        }
    }

    /// Identity of the attachment within its record
    pub fn key(&self) -> &str {
        &self.name
    }
}

/// Fully normalized item, ready for the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRecord {
    pub namespace: String,
    pub id: String,
    pub fields: FieldMap,
    pub metadata: MetadataPayload,
    pub attachments: Vec<Attachment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_are_not_written() {
        let mut fields = FieldMap::new();
        fields.set("doi", "");
        fields.set("author", "abc1d");
        assert!(!fields.contains_key("doi"));
        assert_eq!(fields.get("author"), Some("abc1d"));
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_defaults() {
        let fields = FieldMap::with_defaults();
        assert_eq!(fields.get("draft"), Some("false"));
    }

    #[test]
    fn test_merge_overrides() {
        let mut computed = FieldMap::with_defaults();
        computed.set("depositor", "computed");
        computed.set("author", "abc");

        let mut extras = FieldMap::new();
        extras.set("depositor", "explicit");

        computed.merge(extras);
        assert_eq!(computed.get("depositor"), Some("explicit"));
        assert_eq!(computed.get("author"), Some("abc"));
    }

    #[test]
    fn test_attachment_name_is_trimmed() {
        let attachment = Attachment::new("  thesis.pdf \n", "application/pdf", vec![1, 2, 3]);
        assert_eq!(attachment.name, "thesis.pdf");
        assert_eq!(attachment.key(), "thesis.pdf");
        assert!(attachment.created.is_none());
        assert!(attachment.modified.is_none());
    }

    #[test]
    fn test_metadata_payload_is_json() {
        let payload = MetadataPayload::json(&serde_json::json!({"title": "x"})).unwrap();
        assert_eq!(payload.media_type, "application/json");
        assert_eq!(payload.payload, br#"{"title":"x"}"#.to_vec());
    }
}
