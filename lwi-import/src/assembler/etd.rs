//! Theses and dissertations
//!
//! Advisors are inline six-line `contributor` blocks in `work.json`, which
//! also carries the author (`creator`) and the embargo state. An optional
//! `embargo.json` adds the during/after labels.

use super::{
    apply_visibility, auxiliary, json_metadata, keys, load_auxiliary, load_license, FamilyParts,
    ImportSettings,
};
use crate::embargo::EmbargoPolicy;
use crate::error::ImportResult;
use crate::extract::RawItem;
use crate::metadata::EtdWork;
use crate::people::{parse_inline_blocks, strip_email_suffix};
use crate::record::FieldMap;
use crate::sidecar::EMBARGO_FILE;
use std::path::Path;

pub(super) fn assemble(
    dir: &Path,
    primary: &RawItem,
    settings: &ImportSettings,
) -> ImportResult<FamilyParts> {
    // Structural for theses: a wrong shape fails the item
    let creator = strip_email_suffix(&primary.string("creator")?, &settings.email_suffix);
    let embargo_state = primary.string("embargo_state")?;

    let mut work = EtdWork {
        title: auxiliary(primary.first_string("title")),
        author: creator.clone(),
        advisors: parse_inline_blocks(
            &auxiliary(primary.string_array("contributor")),
            &settings.email_suffix,
        ),
        abstract_text: auxiliary(primary.string("abstract")),
        degree: auxiliary(primary.string("degree")),
        program: auxiliary(primary.string("department")),
        language: auxiliary(primary.string("language")),
        keywords: auxiliary(primary.string_array("keyword")),
        sponsors: auxiliary(primary.string_array("sponsoring_agency")),
        related_urls: auxiliary(primary.string_array("related_url")),
        notes: auxiliary(primary.string("notes")),
        ..EtdWork::default()
    };
    work.license = load_license(dir)?;

    let mut policy = EmbargoPolicy::with_default(embargo_state);
    policy.release_date = auxiliary(primary.string("embargo_end_date"));
    if let Some(embargo) = load_auxiliary(dir, EMBARGO_FILE)? {
        policy.apply_embargo_document(&embargo);
    }
    let resolved = policy.resolve(&settings.institutional_label);

    work.visibility = resolved.default_visibility.clone();
    work.embargo_release = resolved.embargo_release.clone();

    let mut fields = FieldMap::with_defaults();
    fields.set(keys::AUTHOR, creator.as_str());
    fields.set(keys::DEPOSITOR, creator);
    apply_visibility(&mut fields, &resolved);

    Ok(FamilyParts {
        fields,
        metadata: json_metadata(&work)?,
    })
}
