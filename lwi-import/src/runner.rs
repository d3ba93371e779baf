//! Import run over a directory of item directories
//!
//! Items are processed strictly one after another in file-name order. A
//! failed item is logged and counted; it never stops the run. The item
//! limit is checked before each item and ends the run cleanly.

use crate::assembler::RecordAssembler;
use crate::error::{ImportError, ImportResult};
use crate::store::ObjectStore;
use lwi_common::logging::ALWAYS_TARGET;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

/// Per-run options
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub import_dir: PathBuf,
    /// Stop after this many items (ok + failed); 0 means no limit
    pub limit: usize,
    /// Assemble records but do not store them
    pub dry_run: bool,
}

/// Outcome counts of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub ok: usize,
    pub errors: usize,
    pub dry_run: bool,
}

impl ImportSummary {
    /// Items attempted so far
    pub fn processed(&self) -> usize {
        self.ok + self.errors
    }

    /// Final run report
    pub fn message(&self) -> String {
        let verb = if self.dry_run { "processed" } else { "imported" };
        format!(
            "terminate normally, {} {} object(s) and {} error(s)",
            verb, self.ok, self.errors
        )
    }
}

/// Item directories directly under `import_dir`, sorted by name
pub fn item_directories(import_dir: &Path) -> ImportResult<Vec<PathBuf>> {
    let mut dirs = Vec::new();

    for entry in WalkDir::new(import_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(import_dir).to_path_buf();
            ImportError::io(path, e.into())
        })?;

        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }

    Ok(dirs)
}

/// Assemble (and unless dry, store) every item under the import directory
pub async fn run_import<S>(
    assembler: &RecordAssembler,
    store: &S,
    options: &RunOptions,
) -> ImportResult<ImportSummary>
where
    S: ObjectStore + ?Sized,
{
    let items = item_directories(&options.import_dir)?;
    let total = items.len();

    if assembler.settings().exclude_files {
        info!(target: ALWAYS_TARGET, "Excluding file import!!");
    }
    if options.dry_run {
        info!(target: ALWAYS_TARGET, "Dryrun, NO import!!");
    }

    let mut summary = ImportSummary {
        dry_run: options.dry_run,
        ..ImportSummary::default()
    };

    for (ix, dir) in items.iter().enumerate() {
        if options.limit != 0 && summary.processed() >= options.limit {
            debug!("terminating after {} object(s)", options.limit);
            break;
        }

        info!("importing from {} ({} of {})", dir.display(), ix + 1, total);

        let record = match assembler.assemble(dir) {
            Ok(record) => record,
            Err(e) => {
                error!("creating object from {} ({}), continuing", dir.display(), e);
                summary.errors += 1;
                continue;
            }
        };

        if !options.dry_run {
            if let Err(e) = store.create(&record).await {
                error!(
                    "importing ns/oid [{}/{}] ({}), continuing",
                    record.namespace, record.id, e
                );
                summary.errors += 1;
                continue;
            }
        }

        summary.ok += 1;
    }

    info!(target: ALWAYS_TARGET, "{}", summary.message());
    Ok(summary)
}
