//! Embargo and visibility resolution
//!
//! Resolution runs in two phases. The temporal phase picks raw labels from
//! the item's policy and the current time; the terminology phase then
//! rewrites legacy labels into the destination's vocabulary. Keeping them
//! apart means the temporal rules never see label spelling.

use crate::dates::{in_the_future_at, is_expected_embargo_format};
use crate::extract::RawItem;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Legacy label for "anyone at the institution"
pub const AUTHENTICATED_VISIBILITY: &str = "authenticated";

/// Visibility inputs for one item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbargoPolicy {
    /// Declared visibility outside of any embargo
    pub default_visibility: String,
    /// Release date, expected as `YYYY-MM-DDTHH:MM:SS±HH:MM`
    pub release_date: String,
    pub visibility_during: String,
    pub visibility_after: String,
}

/// Effective visibility outputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedVisibility {
    pub default_visibility: String,
    /// Release date, verbatim, when it passed the strict format check
    pub embargo_release: Option<String>,
    pub post_embargo_visibility: Option<String>,
}

impl EmbargoPolicy {
    /// Policy with a default visibility and no embargo
    pub fn with_default(default_visibility: impl Into<String>) -> Self {
        Self {
            default_visibility: default_visibility.into(),
            ..Self::default()
        }
    }

    /// Fill embargo fields from an `embargo.json` document
    ///
    /// Values already present in the policy are kept. Fields with the wrong
    /// shape are skipped with a warning.
    pub fn apply_embargo_document(&mut self, embargo: &RawItem) {
        fill_from(&mut self.release_date, embargo, "embargo_release_date");
        fill_from(&mut self.visibility_during, embargo, "visibility_during_embargo");
        fill_from(&mut self.visibility_after, embargo, "visibility_after_embargo");
    }

    /// Resolve against the wall clock and apply the terminology remap
    pub fn resolve(self, institutional_label: &str) -> ResolvedVisibility {
        self.resolve_at(lwi_common::time::now(), institutional_label)
    }

    /// Resolve against an explicit reference time and apply the remap
    pub fn resolve_at(self, now: DateTime<Utc>, institutional_label: &str) -> ResolvedVisibility {
        self.resolve_raw(now).remap_terminology(institutional_label)
    }

    /// Temporal phase only; labels are returned as declared
    pub fn resolve_raw(self, now: DateTime<Utc>) -> ResolvedVisibility {
        let release = self.release_date.as_str();

        if release.is_empty() {
            return ResolvedVisibility {
                default_visibility: self.default_visibility,
                ..ResolvedVisibility::default()
            };
        }

        if !is_expected_embargo_format(release) {
            warn!("unexpected embargo release date format [{}], ignoring embargo", release);
            return ResolvedVisibility {
                default_visibility: self.default_visibility,
                ..ResolvedVisibility::default()
            };
        }

        let under_embargo = in_the_future_at(release, now);
        debug!(release = %release, under_embargo, "Resolved embargo state");

        let default_visibility = if under_embargo && !self.visibility_during.is_empty() {
            self.visibility_during
        } else {
            self.default_visibility.clone()
        };

        let post_embargo_visibility = if self.visibility_after.is_empty() {
            self.default_visibility
        } else {
            self.visibility_after
        };

        ResolvedVisibility {
            default_visibility,
            embargo_release: Some(self.release_date.clone()),
            post_embargo_visibility: Some(post_embargo_visibility),
        }
    }
}

impl ResolvedVisibility {
    /// Rewrite legacy labels into the destination's vocabulary
    pub fn remap_terminology(self, institutional_label: &str) -> Self {
        Self {
            default_visibility: remap_label(self.default_visibility, institutional_label),
            embargo_release: self.embargo_release,
            post_embargo_visibility: self
                .post_embargo_visibility
                .map(|label| remap_label(label, institutional_label)),
        }
    }
}

fn remap_label(label: String, institutional_label: &str) -> String {
    if label == AUTHENTICATED_VISIBILITY {
        institutional_label.to_string()
    } else {
        label
    }
}

fn fill_from(slot: &mut String, document: &RawItem, field: &str) {
    if !slot.is_empty() {
        return;
    }
    match document.string(field) {
        Ok(value) => *slot = value,
        Err(e) => warn!("{}", e),
    }
}
