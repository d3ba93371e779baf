//! Fields copied straight from the primary document
//!
//! These override whatever the family rules computed for the same key.

use super::{auxiliary, keys};
use crate::dates::normalize_date;
use crate::extract::RawItem;
use crate::people::strip_email_suffix;
use crate::record::FieldMap;

/// Explicit field values carried by the primary document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportExtras {
    pub admin_notes: Vec<String>,
    /// Normalized upload date
    pub create_date: String,
    pub depositor: String,
    pub doi: String,
    /// Normalized publication date
    pub publish_date: String,
    pub source: String,
}

impl ImportExtras {
    pub fn from_document(primary: &RawItem, email_suffix: &str) -> Self {
        let mut publish_date = auxiliary(primary.string("date_published"));
        if publish_date.trim().is_empty() {
            publish_date = auxiliary(primary.string("published_date"));
        }

        Self {
            admin_notes: auxiliary(primary.string_array("admin_notes")),
            create_date: normalize_date(&auxiliary(primary.string("date_uploaded"))),
            depositor: strip_email_suffix(&auxiliary(primary.string("depositor")), email_suffix),
            doi: auxiliary(primary.string("doi")).trim().to_string(),
            publish_date: normalize_date(&publish_date),
            source: auxiliary(primary.first_string("source")).trim().to_string(),
        }
    }

    /// Field map holding only the non-empty extras
    pub fn into_fields(self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.set(keys::ADMIN_NOTES, self.admin_notes.join("\n"));
        fields.set(keys::CREATE_DATE, self.create_date);
        fields.set(keys::DEPOSITOR, self.depositor);
        fields.set(keys::DOI, self.doi);
        fields.set(keys::PUBLISH_DATE, self.publish_date);
        fields.set(keys::SOURCE, self.source);
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extras(json: &str) -> ImportExtras {
        let raw = RawItem::from_slice(json.as_bytes()).unwrap();
        ImportExtras::from_document(&raw, "@virginia.edu")
    }

    #[test]
    fn test_extras_are_normalized() {
        let extras = extras(
            r#"{
                "admin_notes": ["first note", "second note"],
                "date_uploaded": "2016-03-04T10:11:12.000Z",
                "depositor": "abc1d@virginia.edu",
                "doi": " doi:10.18130/V3XX ",
                "date_published": "March 5th, 2016",
                "source": ["libra-oa:1234"]
            }"#,
        );

        assert_eq!(extras.admin_notes.len(), 2);
        assert_eq!(extras.create_date, "2016-03-04T10:11:12Z");
        assert_eq!(extras.depositor, "abc1d");
        assert_eq!(extras.doi, "doi:10.18130/V3XX");
        assert_eq!(extras.publish_date, "2016-03-05T00:00:00Z");
        assert_eq!(extras.source, "libra-oa:1234");

        let fields = extras.into_fields();
        assert_eq!(fields.get("admin-notes"), Some("first note\nsecond note"));
        assert_eq!(fields.get("create-date"), Some("2016-03-04T10:11:12Z"));
    }

    #[test]
    fn test_published_date_is_fallback_key() {
        let extras = extras(r#"{"published_date": "2012"}"#);
        assert_eq!(extras.publish_date, "2012-01-01T00:00:00Z");
    }

    #[test]
    fn test_absent_extras_write_nothing() {
        let fields = extras(r#"{"id": "x"}"#).into_fields();
        assert!(fields.is_empty());
    }

    #[test]
    fn test_bad_shapes_are_omitted() {
        let fields = extras(r#"{"doi": ["10.1/x"], "source": "not-an-array", "admin_notes": "note"}"#)
            .into_fields();
        assert!(fields.is_empty());
    }
}
