//! Item directory file naming
//!
//! Sidecar files are numbered from 1 (`fileset-1.json`, `fileset-2.json`, …).
//! Enumeration stops at the first index that does not exist, even when a
//! higher index does.

use crate::error::{ImportError, ImportResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Primary document name
pub const WORK_FILE: &str = "work.json";
/// Attachment descriptor prefix
pub const FILESET_PREFIX: &str = "fileset";
/// Author sidecar prefix
pub const AUTHOR_PREFIX: &str = "author";
/// Contributor sidecar prefix
pub const CONTRIBUTOR_PREFIX: &str = "contributor";
/// Optional visibility document
pub const VISIBILITY_FILE: &str = "visibility.json";
/// Optional embargo document
pub const EMBARGO_FILE: &str = "embargo.json";
/// Optional rights document
pub const RIGHTS_FILE: &str = "rights.json";

/// Path of sidecar `index` for `prefix`
pub fn sidecar_path(dir: &Path, prefix: &str, index: usize) -> PathBuf {
    dir.join(format!("{}-{}.json", prefix, index))
}

/// Whether a path should be treated as present
///
/// Anything other than a definite "not found" counts as present, so that a
/// permission problem surfaces as a read error instead of ending enumeration.
pub fn file_exists(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(_) => true,
        Err(e) => e.kind() != ErrorKind::NotFound,
    }
}

/// Contiguously numbered sidecar paths, stopping at the first gap
pub fn numbered_sidecars<'a>(dir: &'a Path, prefix: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
    (1..)
        .map(move |index| sidecar_path(dir, prefix, index))
        .take_while(|path| file_exists(path))
}

/// Read a whole file
pub fn load_file(path: &Path) -> ImportResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| ImportError::io(path, e))
}

/// Read an optional document; `Ok(None)` when it does not exist
pub fn load_optional(path: &Path) -> ImportResult<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(buf) => Ok(Some(buf)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ImportError::io(path, e)),
    }
}
