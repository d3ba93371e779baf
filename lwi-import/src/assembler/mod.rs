//! Record assembly
//!
//! Turns one item directory into a [`CanonicalRecord`]. The primary
//! document is read once; identity is mandatory, everything else is
//! best-effort. Family-specific rules (where people and visibility come
//! from) live in the `open` and `etd` submodules.
//!
//! # Failure policy
//! - unreadable or undecodable `work.json`, or no `id`: the item fails
//! - auxiliary field with the wrong shape: warning, field omitted
//! - attachment named but missing: warning, attachment skipped
//! - any other read failure: the item fails

mod etd;
mod extras;
mod open;

pub use extras::ImportExtras;

use crate::embargo::ResolvedVisibility;
use crate::error::{ImportError, ImportResult};
use crate::extract::{DeserializeError, RawItem};
use crate::manifest::reconcile_attachments;
use crate::record::{CanonicalRecord, FieldMap, MetadataPayload};
use crate::sidecar::{load_file, load_optional, WORK_FILE};
use lwi_common::config::{DEFAULT_INSTITUTIONAL_VISIBILITY, DEFAULT_INSTITUTION_EMAIL_SUFFIX};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Field map keys
pub mod keys {
    pub const DRAFT: &str = "draft";
    pub const AUTHOR: &str = "author";
    pub const DEPOSITOR: &str = "depositor";
    pub const DEFAULT_VISIBILITY: &str = "default-visibility";
    pub const EMBARGO_RELEASE: &str = "embargo-release";
    pub const EMBARGO_RELEASE_VISIBILITY: &str = "embargo-release-visibility";
    pub const CREATE_DATE: &str = "create-date";
    pub const PUBLISH_DATE: &str = "publish-date";
    pub const DOI: &str = "doi";
    pub const SOURCE: &str = "source";
    pub const ADMIN_NOTES: &str = "admin-notes";
}

/// Kind of legacy export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ItemFamily {
    /// Open-access works (people in numbered sidecar files)
    #[default]
    Open,
    /// Theses and dissertations (people inline in the primary document)
    Etd,
}

impl fmt::Display for ItemFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemFamily::Open => write!(f, "open"),
            ItemFamily::Etd => write!(f, "etd"),
        }
    }
}

/// Settings that shape every record of a run
#[derive(Debug, Clone)]
pub struct ImportSettings {
    pub namespace: String,
    pub family: ItemFamily,
    /// Skip attachment reconciliation entirely
    pub exclude_files: bool,
    /// Replaces the legacy `authenticated` visibility label
    pub institutional_label: String,
    /// Stripped from identifiers found in the primary document
    pub email_suffix: String,
}

impl ImportSettings {
    pub fn new(namespace: impl Into<String>, family: ItemFamily) -> Self {
        Self {
            namespace: namespace.into(),
            family,
            exclude_files: false,
            institutional_label: DEFAULT_INSTITUTIONAL_VISIBILITY.to_string(),
            email_suffix: DEFAULT_INSTITUTION_EMAIL_SUFFIX.to_string(),
        }
    }
}

/// Family-specific part of a record
pub(crate) struct FamilyParts {
    pub fields: FieldMap,
    pub metadata: MetadataPayload,
}

/// Builds canonical records from item directories
pub struct RecordAssembler {
    settings: ImportSettings,
}

impl RecordAssembler {
    pub fn new(settings: ImportSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// Assemble the record for one item directory
    pub fn assemble(&self, dir: &Path) -> ImportResult<CanonicalRecord> {
        let work_path = dir.join(WORK_FILE);
        let primary = RawItem::from_slice(&load_file(&work_path)?)?;

        let id = primary.string("id")?.trim().to_string();
        if id.is_empty() {
            return Err(ImportError::MissingIdentity(work_path));
        }

        let parts = match self.settings.family {
            ItemFamily::Open => open::assemble(dir, &primary, &self.settings)?,
            ItemFamily::Etd => etd::assemble(dir, &primary, &self.settings)?,
        };

        let mut fields = parts.fields;
        fields.merge(ImportExtras::from_document(&primary, &self.settings.email_suffix).into_fields());

        let attachments = if self.settings.exclude_files {
            Vec::new()
        } else {
            let attachments = reconcile_attachments(dir)?;
            if attachments.is_empty() {
                info!("no files for [{}]", id);
            } else {
                debug!("imported {} file(s) for [{}]", attachments.len(), id);
            }
            attachments
        };

        Ok(CanonicalRecord {
            namespace: self.settings.namespace.clone(),
            id,
            fields,
            metadata: parts.metadata,
            attachments,
        })
    }
}

/// Value of an auxiliary field; shape errors become a warning and the empty value
pub(crate) fn auxiliary<T: Default>(result: Result<T, DeserializeError>) -> T {
    result.unwrap_or_else(|e| {
        warn!("{}", e);
        T::default()
    })
}

/// Load an optional auxiliary document
///
/// A missing document is `None`. So is one that cannot be decoded, with a
/// warning. Read failures propagate.
pub(crate) fn load_auxiliary(dir: &Path, name: &str) -> ImportResult<Option<RawItem>> {
    let path = dir.join(name);
    let Some(buf) = load_optional(&path)? else {
        return Ok(None);
    };

    match RawItem::from_slice(&buf) {
        Ok(raw) => Ok(Some(raw)),
        Err(e) => {
            warn!("ignoring {} ({})", path.display(), e);
            Ok(None)
        }
    }
}

/// License from `rights.json`, "" when absent
pub(crate) fn load_license(dir: &Path) -> ImportResult<String> {
    Ok(load_auxiliary(dir, crate::sidecar::RIGHTS_FILE)?
        .map(|rights| auxiliary(rights.first_string("rights")))
        .unwrap_or_default())
}

/// Write resolved visibility into the field map
pub(crate) fn apply_visibility(fields: &mut FieldMap, resolved: &ResolvedVisibility) {
    fields.set(keys::DEFAULT_VISIBILITY, resolved.default_visibility.as_str());
    if let Some(release) = &resolved.embargo_release {
        fields.set(keys::EMBARGO_RELEASE, release.as_str());
    }
    if let Some(after) = &resolved.post_embargo_visibility {
        fields.set(keys::EMBARGO_RELEASE_VISIBILITY, after.as_str());
    }
}

/// Serialize family metadata
pub(crate) fn json_metadata<T: serde::Serialize>(work: &T) -> ImportResult<MetadataPayload> {
    MetadataPayload::json(work).map_err(ImportError::Serialize)
}
