//! Open-access works
//!
//! Authors and contributors come from numbered sidecar files. Default
//! visibility comes from `visibility.json`, the embargo from `embargo.json`.

use super::{
    apply_visibility, auxiliary, json_metadata, keys, load_auxiliary, load_license, FamilyParts,
    ImportSettings,
};
use crate::dates::normalize_date;
use crate::embargo::EmbargoPolicy;
use crate::error::{ImportError, ImportResult};
use crate::extract::RawItem;
use crate::metadata::OpenWork;
use crate::people::{load_person_sidecars, Person};
use crate::record::FieldMap;
use crate::sidecar::{AUTHOR_PREFIX, CONTRIBUTOR_PREFIX, EMBARGO_FILE, VISIBILITY_FILE};
use std::path::Path;
use tracing::warn;

pub(super) fn assemble(
    dir: &Path,
    primary: &RawItem,
    settings: &ImportSettings,
) -> ImportResult<FamilyParts> {
    let mut work = OpenWork {
        resource_type: auxiliary(primary.string("resource_type")),
        title: auxiliary(primary.first_string("title")),
        abstract_text: auxiliary(primary.string("abstract")),
        languages: auxiliary(primary.string_array("language")),
        keywords: auxiliary(primary.string_array("keyword")),
        publisher: auxiliary(primary.string("publisher")),
        citation: auxiliary(primary.string("source_citation")),
        publication_date: normalize_date(&auxiliary(primary.string("published_date"))),
        sponsors: auxiliary(primary.string_array("sponsoring_agency")),
        related_urls: auxiliary(primary.string_array("related_url")),
        notes: auxiliary(primary.string("notes")),
        ..OpenWork::default()
    };

    work.authors = people(dir, AUTHOR_PREFIX)?;
    work.contributors = people(dir, CONTRIBUTOR_PREFIX)?;
    work.license = load_license(dir)?;

    let mut policy = EmbargoPolicy::with_default(declared_visibility(dir)?);
    if let Some(embargo) = load_auxiliary(dir, EMBARGO_FILE)? {
        policy.apply_embargo_document(&embargo);
    }
    let resolved = policy.resolve(&settings.institutional_label);

    work.visibility = resolved.default_visibility.clone();
    work.embargo_release = resolved.embargo_release.clone();

    let mut fields = FieldMap::with_defaults();
    if let Some(first) = work.authors.first() {
        fields.set(keys::AUTHOR, first.identifier.as_str());
        fields.set(keys::DEPOSITOR, first.identifier.as_str());
    }
    apply_visibility(&mut fields, &resolved);

    Ok(FamilyParts {
        fields,
        metadata: json_metadata(&work)?,
    })
}

/// People from sidecars; an undecodable sidecar drops the list with a warning
fn people(dir: &Path, prefix: &str) -> ImportResult<Vec<Person>> {
    match load_person_sidecars(dir, prefix) {
        Ok(people) => Ok(people),
        Err(e @ ImportError::Json { .. }) => {
            warn!("{}, omitting {} list", e, prefix);
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

fn declared_visibility(dir: &Path) -> ImportResult<String> {
    Ok(load_auxiliary(dir, VISIBILITY_FILE)?
        .map(|doc| auxiliary(doc.string("visibility")))
        .unwrap_or_default())
}
