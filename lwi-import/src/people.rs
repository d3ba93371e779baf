//! Contributor, advisor and author list assembly
//!
//! People arrive in one of two shapes:
//! - **Inline blocks**: strings in the primary document, six lines each
//!   (index, computing id, first name, last name, department, institution)
//! - **Sidecar files**: `author-N.json` / `contributor-N.json`, one person each
//!
//! The order people appear in is not trustworthy. Each record carries an
//! index, and the final list is stably sorted on it.

use crate::error::{ImportError, ImportResult};
use crate::sidecar::{load_file, numbered_sidecars};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::warn;

/// Number of lines in an inline person block
const INLINE_BLOCK_LINES: usize = 6;

/// A person as declared in the export, with its ordering index
///
/// Missing and `null` fields both decode as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PersonRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub index: i64,
    #[serde(default, rename = "computing_id", deserialize_with = "null_as_default")]
    pub identifier: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub department: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub institution: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A person in the final, ordered list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Person {
    #[serde(rename = "computeId")]
    pub identifier: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub department: String,
    pub institution: String,
}

impl From<PersonRecord> for Person {
    fn from(record: PersonRecord) -> Self {
        Self {
            identifier: record.identifier.trim().to_string(),
            first_name: record.first_name.trim().to_string(),
            last_name: record.last_name.trim().to_string(),
            department: record.department.trim().to_string(),
            institution: record.institution.trim().to_string(),
        }
    }
}

/// Parse inline blocks into an ordered person list
///
/// Malformed blocks are dropped with a warning.
pub fn parse_inline_blocks(blocks: &[String], email_suffix: &str) -> Vec<Person> {
    let records = blocks
        .iter()
        .filter_map(|block| parse_inline_block(block, email_suffix))
        .collect();
    order_people(records)
}

/// Parse one six-line block
pub fn parse_inline_block(block: &str, email_suffix: &str) -> Option<PersonRecord> {
    let normalized = block.replace("\r\n", "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();

    if lines.len() != INLINE_BLOCK_LINES {
        warn!(
            "person block has {} line(s), expected {}, skipping [{}]",
            lines.len(),
            INLINE_BLOCK_LINES,
            block
        );
        return None;
    }

    let index = match lines[0].trim().parse::<i64>() {
        Ok(index) => index,
        Err(_) => {
            warn!("person block has a bad index [{}], skipping", lines[0]);
            return None;
        }
    };

    Some(PersonRecord {
        index,
        identifier: strip_email_suffix(lines[1], email_suffix),
        first_name: lines[2].to_string(),
        last_name: lines[3].to_string(),
        department: lines[4].to_string(),
        institution: lines[5].to_string(),
    })
}

/// Load `prefix-1.json`, `prefix-2.json`, … into an ordered person list
pub fn load_person_sidecars(dir: &Path, prefix: &str) -> ImportResult<Vec<Person>> {
    let mut records = Vec::new();

    for path in numbered_sidecars(dir, prefix) {
        let buf = load_file(&path)?;
        let record: PersonRecord = serde_json::from_slice::<Value>(&buf)
            .and_then(|doc| serde_json::from_value(fold_keys(doc)))
            .map_err(|source| ImportError::Json { path: path.clone(), source })?;
        records.push(record);
    }

    Ok(order_people(records))
}

/// Lower-case the keys of a sidecar object
///
/// Sidecar keys match case-insensitively; a key already spelled in lower
/// case wins over any other spelling of it.
fn fold_keys(doc: Value) -> Value {
    let Value::Object(map) = doc else {
        return doc;
    };

    let mut folded = Map::new();
    for (key, value) in map {
        let lower = key.to_lowercase();
        if key == lower || !folded.contains_key(&lower) {
            folded.insert(lower, value);
        }
    }
    Value::Object(folded)
}

/// Stable sort by index, project, drop exact duplicates
pub fn order_people(mut records: Vec<PersonRecord>) -> Vec<Person> {
    records.sort_by_key(|r| r.index);

    let mut people: Vec<Person> = Vec::with_capacity(records.len());
    for person in records.into_iter().map(Person::from) {
        if !people.contains(&person) {
            people.push(person);
        }
    }
    people
}

/// Remove an institutional e-mail suffix and surrounding whitespace
pub fn strip_email_suffix(identifier: &str, email_suffix: &str) -> String {
    if email_suffix.is_empty() {
        return identifier.trim().to_string();
    }
    identifier.replace(email_suffix, "").trim().to_string()
}
