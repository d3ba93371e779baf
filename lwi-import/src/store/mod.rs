//! Destination object store
//!
//! The assembler never talks to a store. The runner hands each finished
//! record to an [`ObjectStore`] and only counts the outcome.

mod sqlite;

pub use sqlite::{SqliteStore, StoredObject};

use crate::error::ImportResult;
use crate::record::CanonicalRecord;

/// Persistence for canonical records
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create a new object from a record, returning its identity
    ///
    /// Creating an identity that already exists in the namespace fails.
    async fn create(&self, record: &CanonicalRecord) -> ImportResult<String>;
}
