//! In-memory document store
//!
//! Mirrors the SQLite backend's ordering and merge rules so tests written
//! against one hold for the other.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{
    check_field_name, compare_values, merge_fields, new_document_id, stamp_created, Document,
    DocumentStore, Fields, SortSpec, StoreError, StoreResult,
};

/// In-memory implementation of [`DocumentStore`]
///
/// Documents are kept per collection in insertion order.
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of documents across all collections
    pub fn len(&self) -> usize {
        self.collections
            .read()
            .map(|c| c.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every document
    pub fn clear(&self) {
        if let Ok(mut collections) = self.collections.write() {
            collections.clear();
        }
    }

    fn write_merge(
        &self,
        collection: &str,
        id: &str,
        expected_version: Option<u64>,
        patch: Fields,
    ) -> StoreResult<Document> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;

        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

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
        Ok(doc.clone())
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn list(
        &self,
        collection: &str,
        sort: &SortSpec,
        limit: usize,
    ) -> StoreResult<Vec<Document>> {
        check_field_name(&sort.field)?;
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;

        let mut docs = collections.get(collection).cloned().unwrap_or_default();
        // stable sort keeps insertion order for ties
        docs.sort_by(|a, b| {
            let ord = compare_values(a.field(&sort.field), b.field(&sort.field));
            if sort.descending {
                ord.reverse()
            } else {
                ord
            }
        });
        docs.truncate(limit);
        Ok(docs)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;

        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned())
    }

    async fn create(&self, collection: &str, data: Fields) -> StoreResult<Document> {
        let doc = Document {
            id: new_document_id(),
            version: 1,
            data: stamp_created(data),
        };

        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
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
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;

        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        let before = docs.len();
        docs.retain(|d| d.id != id);

        if docs.len() == before {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }

    async fn filter(&self, collection: &str, criteria: &Fields) -> StoreResult<Vec<Document>> {
        for field in criteria.keys() {
            check_field_name(field)?;
        }

        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;

        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| d.matches(criteria)).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_utilities() {
        let store = MemoryDocumentStore::new();
        assert!(store.is_empty());

        let data = json!({ "name": "Kim" }).as_object().cloned().unwrap();
        store.create("members", data.clone()).await.unwrap();
        store.create("attendance", data).await.unwrap();
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
    }
}
