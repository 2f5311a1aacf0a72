//! Typed access to one collection

use std::marker::PhantomData;
use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{Document, Fields, SharedDocumentStore, SortSpec, StoreError, StoreResult};

/// A record type stored in a named collection
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection name in the document store
    const COLLECTION: &'static str;

    /// Reject values that must never be written
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// A decoded record together with its store metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stored<T> {
    pub id: String,
    pub version: u64,
    pub created_date: Option<DateTime<Utc>>,
    pub updated_date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub value: T,
}

impl<T> Stored<T> {
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Stored<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// Build equality criteria for [`Collection::filter`]
pub fn criteria<'a>(pairs: impl IntoIterator<Item = (&'a str, Value)>) -> Fields {
    pairs
        .into_iter()
        .map(|(field, value)| (field.to_string(), value))
        .collect()
}

/// Typed wrapper over a [`SharedDocumentStore`] for entity `T`
pub struct Collection<T> {
    store: SharedDocumentStore,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Collection<T> {
    pub fn new(store: SharedDocumentStore) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        T::COLLECTION
    }

    pub fn store(&self) -> &SharedDocumentStore {
        &self.store
    }

    pub async fn list(&self, sort: impl Into<SortSpec>, limit: usize) -> StoreResult<Vec<Stored<T>>> {
        let docs = self.store.list(T::COLLECTION, &sort.into(), limit).await?;
        docs.into_iter().map(Self::decode).collect()
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<Stored<T>>> {
        self.store
            .get(T::COLLECTION, id)
            .await?
            .map(Self::decode)
            .transpose()
    }

    pub async fn create(&self, value: &T) -> StoreResult<Stored<T>> {
        let doc = self.store.create(T::COLLECTION, Self::encode(value)?).await?;
        Self::decode(doc)
    }

    /// Overwrite every field of `value` on an existing record
    pub async fn update(&self, id: &str, value: &T) -> StoreResult<Stored<T>> {
        let doc = self
            .store
            .update(T::COLLECTION, id, Self::encode(value)?)
            .await?;
        Self::decode(doc)
    }

    pub async fn update_if_version(
        &self,
        id: &str,
        expected_version: u64,
        value: &T,
    ) -> StoreResult<Stored<T>> {
        let doc = self
            .store
            .update_if_version(T::COLLECTION, id, expected_version, Self::encode(value)?)
            .await?;
        Self::decode(doc)
    }

    /// Merge a partial set of fields; the merged record must still decode
    pub async fn patch(&self, id: &str, fields: Fields) -> StoreResult<Stored<T>> {
        let current = self
            .store
            .get(T::COLLECTION, id)
            .await?
            .ok_or_else(|| StoreError::not_found(T::COLLECTION, id))?;

        let mut merged = current.data;
        merged.extend(fields.clone());
        let candidate: T = serde_json::from_value(Value::Object(merged)).map_err(|e| {
            StoreError::Validation {
                collection: T::COLLECTION.to_string(),
                reason: e.to_string(),
            }
        })?;
        candidate.validate().map_err(|reason| StoreError::Validation {
            collection: T::COLLECTION.to_string(),
            reason,
        })?;

        let doc = self.store.update(T::COLLECTION, id, fields).await?;
        Self::decode(doc)
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.store.delete(T::COLLECTION, id).await
    }

    pub async fn filter(&self, criteria: &Fields) -> StoreResult<Vec<Stored<T>>> {
        let docs = self.store.filter(T::COLLECTION, criteria).await?;
        docs.into_iter().map(Self::decode).collect()
    }

    fn encode(value: &T) -> StoreResult<Fields> {
        value.validate().map_err(|reason| StoreError::Validation {
            collection: T::COLLECTION.to_string(),
            reason,
        })?;

        match serde_json::to_value(value)? {
            Value::Object(fields) => Ok(fields),
            _ => Err(StoreError::Validation {
                collection: T::COLLECTION.to_string(),
                reason: "entity must serialize to a JSON object".to_string(),
            }),
        }
    }

    fn decode(doc: Document) -> StoreResult<Stored<T>> {
        let created_date = doc.created_date();
        let updated_date = doc.updated_date();
        let value = serde_json::from_value(Value::Object(doc.data)).map_err(|e| {
            StoreError::Decode {
                collection: T::COLLECTION.to_string(),
                id: doc.id.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(Stored {
            id: doc.id,
            version: doc.version,
            created_date,
            updated_date,
            value,
        })
    }
}
