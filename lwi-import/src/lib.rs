//! lwi-import library interface
//!
//! Normalizes legacy work-export item directories into canonical records
//! and hands them to an object store.

pub mod assembler;
pub mod dates;
pub mod embargo;
pub mod error;
pub mod extract;
pub mod manifest;
pub mod metadata;
pub mod people;
pub mod record;
pub mod runner;
pub mod sidecar;
pub mod store;

pub use crate::assembler::{ImportSettings, ItemFamily, RecordAssembler};
pub use crate::error::{ImportError, ImportResult};
pub use crate::record::CanonicalRecord;
pub use crate::runner::{run_import, ImportSummary, RunOptions};
pub use crate::store::{ObjectStore, SqliteStore};
