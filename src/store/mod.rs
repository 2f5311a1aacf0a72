//! Document store client
//!
//! Every team record lives in a named collection of schemaless JSON
//! documents. This module provides the store abstraction and two backends:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │          Scheduler / team services (typed entities)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │           Collection<T>  (encode / decode / validate)       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  DocumentStore (untyped maps)               │
//! └─────────────────────────────────────────────────────────────┘
//!                 │                               │
//!                 ▼                               ▼
//!      ┌─────────────────────┐        ┌─────────────────────┐
//!      │ SqliteDocumentStore │        │ MemoryDocumentStore │
//!      └─────────────────────┘        └─────────────────────┘
//! ```
//!
//! The store stamps `created_date` / `updated_date` itself. Updates are a
//! shallow merge of top-level fields. There is no locking across calls:
//! two writers updating the same record is last-write-wins unless the caller
//! opts into [`DocumentStore::update_if_version`].

pub mod collection;
pub mod memory;
pub mod sqlite;

pub use collection::{criteria, Collection, Entity, Stored};
pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{DatabaseBackend, DatabaseConfig};

/// Field stamped on create
pub const CREATED_FIELD: &str = "created_date";

/// Field stamped on create and every update
pub const UPDATED_FIELD: &str = "updated_date";

/// Default number of documents returned by `list`
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Untyped document body
pub type Fields = Map<String, Value>;

// ============================================================================
// Errors
// ============================================================================

/// Errors raised by the document store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("document '{id}' not found in '{collection}'")]
    NotFound { collection: String, id: String },

    #[error("version conflict on '{collection}/{id}': expected {expected}, found {found}")]
    VersionConflict {
        collection: String,
        id: String,
        expected: u64,
        found: u64,
    },

    #[error("invalid field name '{0}'")]
    InvalidField(String),

    #[error("failed to decode '{collection}/{id}': {reason}")]
    Decode {
        collection: String,
        id: String,
        reason: String,
    },

    #[error("invalid {collection} record: {reason}")]
    Validation { collection: String, reason: String },

    #[error("store lock poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Korean description for user-facing messages
    pub fn korean_desc(&self) -> String {
        match self {
            Self::Database(e) => format!("데이터베이스 오류: {e}"),
            Self::Serialization(e) => format!("직렬화 오류: {e}"),
            Self::NotFound { collection, id } => format!("문서를 찾을 수 없음: {collection}/{id}"),
            Self::VersionConflict { .. } => "다른 사용자가 먼저 수정했습니다".to_string(),
            Self::InvalidField(f) => format!("잘못된 필드 이름: {f}"),
            Self::Decode { collection, id, .. } => format!("문서 해석 실패: {collection}/{id}"),
            Self::Validation { reason, .. } => format!("유효하지 않은 데이터: {reason}"),
            Self::LockPoisoned => "저장소 잠금 오류".to_string(),
            Self::Io(e) => format!("입출력 오류: {e}"),
        }
    }

    /// Transient failures the user may retry by hand
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::VersionConflict { .. } | Self::Io(_)
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// Document
// ============================================================================

/// A stored record: id, optimistic-concurrency version and JSON fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    pub version: u64,
    pub data: Fields,
}

impl Document {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    pub fn created_date(&self) -> Option<DateTime<Utc>> {
        self.timestamp(CREATED_FIELD)
    }

    pub fn updated_date(&self) -> Option<DateTime<Utc>> {
        self.timestamp(UPDATED_FIELD)
    }

    fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.field(field)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// True when every criterion equals the top-level field of the same name
    pub fn matches(&self, criteria: &Fields) -> bool {
        criteria
            .iter()
            .all(|(field, expected)| self.field(field).unwrap_or(&Value::Null) == expected)
    }
}

// ============================================================================
// Sort specification
// ============================================================================

/// Sort order for `list`: a field name, `-field` for descending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn parse(spec: &str) -> Self {
        match spec.strip_prefix('-') {
            Some(field) => Self {
                field: field.to_string(),
                descending: true,
            },
            None => Self {
                field: spec.to_string(),
                descending: false,
            },
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::asc(CREATED_FIELD)
    }
}

impl From<&str> for SortSpec {
    fn from(spec: &str) -> Self {
        Self::parse(spec)
    }
}

/// Reject anything that is not a plain identifier
pub(crate) fn check_field_name(field: &str) -> StoreResult<()> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidField(field.to_string()))
    }
}

// ============================================================================
// Store trait
// ============================================================================

/// Generic per-collection document operations
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;

    /// List up to `limit` documents ordered by `sort`
    async fn list(&self, collection: &str, sort: &SortSpec, limit: usize)
        -> StoreResult<Vec<Document>>;

    /// Fetch one document; `None` when the id does not exist
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Insert a new document with a generated id
    async fn create(&self, collection: &str, data: Fields) -> StoreResult<Document>;

    /// Merge `data` into an existing document
    async fn update(&self, collection: &str, id: &str, data: Fields) -> StoreResult<Document>;

    /// Like `update`, but only if the stored version equals `expected_version`
    async fn update_if_version(
        &self,
        collection: &str,
        id: &str,
        expected_version: u64,
        data: Fields,
    ) -> StoreResult<Document>;

    /// Remove a document
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// All documents whose fields equal every criterion
    async fn filter(&self, collection: &str, criteria: &Fields) -> StoreResult<Vec<Document>>;
}

// ============================================================================
// Shared helpers for backends
// ============================================================================

pub(crate) fn now_timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Stamp both timestamps on a fresh document body
pub(crate) fn stamp_created(mut data: Fields) -> Fields {
    let now = now_timestamp();
    data.insert(CREATED_FIELD.to_string(), now.clone());
    data.insert(UPDATED_FIELD.to_string(), now);
    data
}

/// Shallow-merge `patch` into `existing` and restamp `updated_date`
pub(crate) fn merge_fields(existing: &mut Fields, patch: Fields) {
    for (key, value) in patch {
        existing.insert(key, value);
    }
    existing.insert(UPDATED_FIELD.to_string(), now_timestamp());
}

/// SQLite-compatible ordering of JSON values (missing < numbers < text)
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) | Some(Value::Number(_)) => 1,
            Some(_) => 2,
        }
    }

    fn as_number(v: &Value) -> f64 {
        match v {
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    fn as_text(v: &Value) -> String {
        match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    match (rank(a), rank(b)) {
        (ra, rb) if ra != rb => ra.cmp(&rb),
        (0, _) => Ordering::Equal,
        (1, _) => {
            let (x, y) = (a.map(as_number), b.map(as_number));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        _ => a.map(as_text).cmp(&b.map(as_text)),
    }
}

// ============================================================================
// Shared Store Types
// ============================================================================

/// Thread-safe shared store handle
pub type SharedDocumentStore = Arc<dyn DocumentStore>;

/// Create a shared SQLite store
pub fn create_sqlite_store(path: impl AsRef<Path>) -> StoreResult<SharedDocumentStore> {
    Ok(Arc::new(SqliteDocumentStore::new(path)?))
}

/// Create a shared in-memory store
pub fn create_memory_store() -> SharedDocumentStore {
    Arc::new(MemoryDocumentStore::new())
}

/// Open the backend selected in configuration
pub fn open_store(config: &DatabaseConfig) -> StoreResult<SharedDocumentStore> {
    match config.backend {
        DatabaseBackend::Sqlite => create_sqlite_store(&config.path),
        DatabaseBackend::Memory => Ok(create_memory_store()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(data: Value) -> Document {
        Document {
            id: "d1".to_string(),
            version: 1,
            data: data.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn test_sort_spec_parse() {
        assert_eq!(SortSpec::parse("-date"), SortSpec::desc("date"));
        assert_eq!(SortSpec::parse("name"), SortSpec::asc("name"));
        assert_eq!(SortSpec::default(), SortSpec::asc("created_date"));
    }

    #[test]
    fn test_field_name_check() {
        assert!(check_field_name("year_month").is_ok());
        assert!(check_field_name("a.b").is_err());
        assert!(check_field_name("").is_err());
        assert!(check_field_name("x'); DROP").is_err());
    }

    #[test]
    fn test_document_matches() {
        let d = doc(json!({ "year_month": "2024-06", "status": "available" }));

        let mut criteria = Fields::new();
        criteria.insert("year_month".into(), json!("2024-06"));
        assert!(d.matches(&criteria));

        criteria.insert("status".into(), json!("unavailable"));
        assert!(!d.matches(&criteria));

        let mut missing = Fields::new();
        missing.insert("nope".into(), Value::Null);
        assert!(d.matches(&missing));
    }

    #[test]
    fn test_compare_values_sqlite_order() {
        let n = json!(5);
        let s = json!("a");
        assert_eq!(compare_values(None, Some(&n)), Ordering::Less);
        assert_eq!(compare_values(Some(&n), Some(&s)), Ordering::Less);
        assert_eq!(compare_values(Some(&json!("b")), Some(&s)), Ordering::Greater);
        assert_eq!(compare_values(Some(&json!(2)), Some(&json!(10))), Ordering::Less);
    }

    #[test]
    fn test_merge_restamps_updated() {
        let mut existing = stamp_created(Fields::new());
        let created = existing[CREATED_FIELD].clone();
        let mut patch = Fields::new();
        patch.insert("status".into(), json!("confirmed"));
        merge_fields(&mut existing, patch);

        assert_eq!(existing["status"], "confirmed");
        assert_eq!(existing[CREATED_FIELD], created);
        assert!(existing.contains_key(UPDATED_FIELD));
    }

    #[test]
    fn test_timestamps_parse() {
        let d = Document {
            id: "x".into(),
            version: 1,
            data: stamp_created(Fields::new()),
        };
        assert!(d.created_date().is_some());
        assert!(d.updated_date().is_some());
    }
}
