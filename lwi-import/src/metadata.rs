//! Domain metadata for the two legacy item families
//!
//! These are the descriptions stored as each object's metadata payload.
//! They are filled in by the assembler and serialized once, as JSON.

use crate::people::Person;
use serde::Serialize;

/// Open-access work description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenWork {
    pub visibility: String,
    pub resource_type: String,
    pub title: String,
    pub authors: Vec<Person>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub license: String,
    pub languages: Vec<String>,
    pub keywords: Vec<String>,
    pub contributors: Vec<Person>,
    pub publisher: String,
    pub citation: String,
    pub publication_date: String,
    pub sponsors: Vec<String>,
    #[serde(rename = "relatedURLs")]
    pub related_urls: Vec<String>,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embargo_release: Option<String>,
}

/// Thesis / dissertation description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EtdWork {
    pub visibility: String,
    pub title: String,
    /// Computing id of the thesis author
    pub author: String,
    pub advisors: Vec<Person>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub degree: String,
    pub program: String,
    pub license: String,
    pub language: String,
    pub keywords: Vec<String>,
    pub sponsors: Vec<String>,
    #[serde(rename = "relatedURLs")]
    pub related_urls: Vec<String>,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embargo_release: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_open_work_wire_names() {
        let work = OpenWork {
            title: "A Study".to_string(),
            abstract_text: "Summary".to_string(),
            related_urls: vec!["https://example.org".to_string()],
            ..OpenWork::default()
        };

        let value: Value = serde_json::to_value(&work).unwrap();
        assert_eq!(value["title"], "A Study");
        assert_eq!(value["abstract"], "Summary");
        assert_eq!(value["relatedURLs"][0], "https://example.org");
        assert!(value.get("resourceType").is_some());
        assert!(value.get("embargoRelease").is_none());
    }

    #[test]
    fn test_etd_work_embargo_release_serialized_when_set() {
        let work = EtdWork {
            embargo_release: Some("2030-01-01T00:00:00+00:00".to_string()),
            ..EtdWork::default()
        };

        let value: Value = serde_json::to_value(&work).unwrap();
        assert_eq!(value["embargoRelease"], "2030-01-01T00:00:00+00:00");
        assert!(value["advisors"].as_array().unwrap().is_empty());
    }
}
