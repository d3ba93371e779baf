//! SQLite object store

use super::ObjectStore;
use crate::error::{ImportError, ImportResult};
use crate::record::CanonicalRecord;
use sha2::{Digest, Sha256};
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

/// Object store backed by a SQLite database
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

/// Stored object as read back from the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub namespace: String,
    pub id: String,
    pub fields: BTreeMap<String, String>,
    pub metadata_mime_type: String,
    pub metadata: Vec<u8>,
    /// Attachment names in stored order
    pub attachments: Vec<String>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `db_path`
    pub async fn open(db_path: &Path) -> ImportResult<Self> {
        let newly_created = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ImportError::io(parent, e))?;
            }
        }

        // Items are stored one at a time; a single connection is enough
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&db_url)
            .await
            .map_err(lwi_common::Error::from)?;

        if newly_created {
            info!("Initialized new database: {}", db_path.display());
        } else {
            info!("Opened existing database: {}", db_path.display());
        }

        let store = Self { pool };
        store.init_tables().await?;
        Ok(store)
    }

    /// Wrap an existing pool; tables must already exist
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables if they do not exist (idempotent)
    pub async fn init_tables(&self) -> ImportResult<()> {
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&self.pool)
            .await
            .map_err(lwi_common::Error::from)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS objects (
                namespace TEXT NOT NULL,
                id TEXT NOT NULL,
                fields TEXT NOT NULL,
                metadata_mime_type TEXT NOT NULL,
                metadata BLOB NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (namespace, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(lwi_common::Error::from)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS blobs (
                guid TEXT PRIMARY KEY,
                namespace TEXT NOT NULL,
                object_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                name TEXT NOT NULL,
                mime_type TEXT NOT NULL,
                sha256 TEXT NOT NULL,
                payload BLOB NOT NULL,
                FOREIGN KEY (namespace, object_id) REFERENCES objects(namespace, id) ON DELETE CASCADE,
                UNIQUE (namespace, object_id, name)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(lwi_common::Error::from)?;

        Ok(())
    }

    /// Number of objects in a namespace
    pub async fn object_count(&self, namespace: &str) -> ImportResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM objects WHERE namespace = ?")
            .bind(namespace)
            .fetch_one(&self.pool)
            .await
            .map_err(lwi_common::Error::from)?;
        Ok(row.get("count"))
    }

    /// Read one object back
    pub async fn fetch(&self, namespace: &str, id: &str) -> ImportResult<Option<StoredObject>> {
        let row = sqlx::query(
            r#"
            SELECT namespace, id, fields, metadata_mime_type, metadata
            FROM objects
            WHERE namespace = ? AND id = ?
            "#,
        )
        .bind(namespace)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(lwi_common::Error::from)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let fields_json: String = row.get("fields");
        let fields: BTreeMap<String, String> = serde_json::from_str(&fields_json)
            .map_err(|e| ImportError::Store(format!("corrupt fields for {}/{}: {}", namespace, id, e)))?;

        let attachments = sqlx::query(
            r#"
            SELECT name FROM blobs
            WHERE namespace = ? AND object_id = ?
            ORDER BY position
            "#,
        )
        .bind(namespace)
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(lwi_common::Error::from)?
        .iter()
        .map(|r| r.get::<String, _>("name"))
        .collect();

        Ok(Some(StoredObject {
            namespace: row.get("namespace"),
            id: row.get("id"),
            fields,
            metadata_mime_type: row.get("metadata_mime_type"),
            metadata: row.get("metadata"),
            attachments,
        }))
    }
}

#[async_trait::async_trait]
impl ObjectStore for SqliteStore {
    async fn create(&self, record: &CanonicalRecord) -> ImportResult<String> {
        let fields_json = serde_json::to_string(&record.fields).map_err(ImportError::Serialize)?;

        let mut tx = self.pool.begin().await.map_err(lwi_common::Error::from)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO objects (namespace, id, fields, metadata_mime_type, metadata, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.namespace)
        .bind(&record.id)
        .bind(&fields_json)
        .bind(&record.metadata.media_type)
        .bind(&record.metadata.payload)
        .bind(lwi_common::time::stamp())
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            let duplicate = e
                .as_database_error()
                .map(|db| db.is_unique_violation())
                .unwrap_or(false);
            if duplicate {
                return Err(ImportError::Store(format!(
                    "object {}/{} already exists",
                    record.namespace, record.id
                )));
            }
            return Err(lwi_common::Error::from(e).into());
        }

        for (position, attachment) in record.attachments.iter().enumerate() {
            let digest = format!("{:x}", Sha256::digest(&attachment.content));
            sqlx::query(
                r#"
                INSERT INTO blobs (guid, namespace, object_id, position, name, mime_type, sha256, payload)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&record.namespace)
            .bind(&record.id)
            .bind(position as i64)
            .bind(&attachment.name)
            .bind(&attachment.media_type)
            .bind(&digest)
            .bind(&attachment.content)
            .execute(&mut *tx)
            .await
            .map_err(lwi_common::Error::from)?;
        }

        tx.commit().await.map_err(lwi_common::Error::from)?;

        debug!(
            namespace = %record.namespace,
            id = %record.id,
            attachments = record.attachments.len(),
            "Created object"
        );

        Ok(record.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Attachment, FieldMap, MetadataPayload};
    use tempfile::TempDir;

    fn record(id: &str) -> CanonicalRecord {
        let mut fields = FieldMap::with_defaults();
        fields.set("author", "abc1d");
        CanonicalRecord {
            namespace: "libraopen".to_string(),
            id: id.to_string(),
            fields,
            metadata: MetadataPayload::json(&serde_json::json!({"title": "T"})).unwrap(),
            attachments: vec![
                Attachment::new("b.txt", "text/plain; charset=utf-8", b"second".to_vec()),
                Attachment::new("a.txt", "text/plain; charset=utf-8", b"first".to_vec()),
            ],
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&temp_dir.path().join("objects.db")).await.unwrap();

        let id = store.create(&record("oa-1")).await.unwrap();
        assert_eq!(id, "oa-1");

        let stored = store.fetch("libraopen", "oa-1").await.unwrap().unwrap();
        assert_eq!(stored.fields.get("draft").map(String::as_str), Some("false"));
        assert_eq!(stored.fields.get("author").map(String::as_str), Some("abc1d"));
        assert_eq!(stored.metadata_mime_type, "application/json");
        assert_eq!(stored.attachments, vec!["b.txt".to_string(), "a.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_identity_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&temp_dir.path().join("objects.db")).await.unwrap();

        store.create(&record("oa-1")).await.unwrap();
        let err = store.create(&record("oa-1")).await.unwrap_err();
        assert!(matches!(err, ImportError::Store(_)));
        assert_eq!(store.object_count("libraopen").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_open_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("dir").join("objects.db");
        let store = SqliteStore::open(&db_path).await.unwrap();
        assert!(db_path.exists());
        assert_eq!(store.object_count("anything").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fetch_unknown_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&temp_dir.path().join("objects.db")).await.unwrap();
        assert!(store.fetch("libraopen", "missing").await.unwrap().is_none());
    }
}
