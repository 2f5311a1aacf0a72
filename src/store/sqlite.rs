//! SQLite document store
//!
//! All collections share one `documents` table. Bodies are stored as JSON
//! text; ordering uses `json_extract` so it happens inside SQLite.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    check_field_name, merge_fields, new_document_id, stamp_created, Document, DocumentStore,
    Fields, SortSpec, StoreError, StoreResult,
};

/// SQLite implementation of [`DocumentStore`]
///
/// Uses `Mutex` to ensure thread-safety for the SQLite connection.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    /// Open (or create) a database file
    pub fn new(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite document store initialized");
        Ok(store)
    }

    /// In-memory database (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;
        Ok(store)
    }

    fn create_schema(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS documents (
                    collection TEXT NOT NULL,
                    id TEXT NOT NULL,
                    data TEXT NOT NULL,
                    version INTEGER NOT NULL DEFAULT 1,
                    PRIMARY KEY (collection, id)
                );

                CREATE INDEX IF NOT EXISTS idx_documents_collection
                    ON documents(collection);
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Number of documents across all collections
    pub fn count(&self) -> StoreResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn fetch(conn: &Connection, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let row = conn
            .query_row(
                "SELECT id, data, version FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, data, version)| to_document(collection, id, &data, version))
            .transpose()
    }

    fn write_merge(
        &self,
        collection: &str,
        id: &str,
        expected_version: Option<u64>,
        patch: Fields,
    ) -> StoreResult<Document> {
        let conn = self.lock()?;
        let mut doc =
            Self::fetch(&conn, collection, id)?.ok_or_else(|| StoreError::not_found(collection, id))?;

        if let Some(expected) = expected_version {
            if doc.version != expected {
                return Err(StoreError::VersionConflict {
                    collection: collection.to_string(),
                    id: id.to_string(),
                    expected,
                    found: doc.version,
                });
            }
        }

        merge_fields(&mut doc.data, patch);
        doc.version += 1;

        conn.execute(
            "UPDATE documents SET data = ?1, version = ?2 WHERE collection = ?3 AND id = ?4",
            params![
                serde_json::to_string(&doc.data)?,
                doc.version as i64,
                collection,
                id
            ],
        )?;

        tracing::debug!(collection, id, version = doc.version, "Document updated");
        Ok(doc)
    }
}

fn to_document(collection: &str, id: String, data: &str, version: i64) -> StoreResult<Document> {
    match serde_json::from_str(data)? {
        serde_json::Value::Object(data) => Ok(Document {
            id,
            version: version.max(0) as u64,
            data,
        }),
        _ => Err(StoreError::Decode {
            collection: collection.to_string(),
            id,
            reason: "document body is not a JSON object".to_string(),
        }),
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn list(
        &self,
        collection: &str,
        sort: &SortSpec,
        limit: usize,
    ) -> StoreResult<Vec<Document>> {
        check_field_name(&sort.field)?;
        let direction = if sort.descending { "DESC" } else { "ASC" };
        let sql = format!(
            "SELECT id, data, version FROM documents WHERE collection = ?1 \
             ORDER BY json_extract(data, '$.' || ?2) {direction}, rowid ASC LIMIT ?3"
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![collection, sort.field, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, data, version) = row?;
            docs.push(to_document(collection, id, &data, version)?);
        }
        Ok(docs)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let conn = self.lock()?;
        Self::fetch(&conn, collection, id)
    }

    async fn create(&self, collection: &str, data: Fields) -> StoreResult<Document> {
        let doc = Document {
            id: new_document_id(),
            version: 1,
            data: stamp_created(data),
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (collection, id, data, version) VALUES (?1, ?2, ?3, ?4)",
            params![collection, doc.id, serde_json::to_string(&doc.data)?, 1i64],
        )?;

        tracing::debug!(collection, id = %doc.id, "Document created");
        Ok(doc)
    }

    async fn update(&self, collection: &str, id: &str, data: Fields) -> StoreResult<Document> {
        self.write_merge(collection, id, None, data)
    }

    async fn update_if_version(
        &self,
        collection: &str,
        id: &str,
        expected_version: u64,
        data: Fields,
    ) -> StoreResult<Document> {
        self.write_merge(collection, id, Some(expected_version), data)
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;

        if removed == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        tracing::debug!(collection, id, "Document deleted");
        Ok(())
    }

    async fn filter(&self, collection: &str, criteria: &Fields) -> StoreResult<Vec<Document>> {
        for field in criteria.keys() {
            check_field_name(field)?;
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, data, version FROM documents WHERE collection = ?1 ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map(params![collection], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, data, version) = row?;
            let doc = to_document(collection, id, &data, version)?;
            if doc.matches(criteria) {
                docs.push(doc);
            }
        }
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("hiel.db");

        let id = {
            let store = SqliteDocumentStore::new(&path).unwrap();
            store
                .create("members", fields(json!({ "name": "Kim" })))
                .await
                .unwrap()
                .id
        };

        let reopened = SqliteDocumentStore::new(&path).unwrap();
        let doc = reopened.get("members", &id).await.unwrap().unwrap();
        assert_eq!(doc.data["name"], "Kim");
        assert_eq!(reopened.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let doc = store
            .create("members", fields(json!({ "name": "Kim" })))
            .await
            .unwrap();

        assert!(store.get("attendance", &doc.id).await.unwrap().is_none());
        assert!(store
            .list("attendance", &SortSpec::default(), 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_rejects_bad_sort_field() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let err = store
            .list("members", &SortSpec::asc("name') --"), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidField(_)));
    }
}
