//! Collection-oriented document store used by every service.
//!
//! Documents are JSON objects keyed by an application-assigned `id` field. The store never
//! generates identifiers itself; callers own identity and the store only enforces the unique
//! indexes declared through [`DocumentStore::create_index`].

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::StoreConfig;

pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongo;

pub use memory::InMemoryDocumentStore;
#[cfg(feature = "mongodb")]
pub use mongo::MongoDocumentStore;

/// A stored JSON object.
pub type Document = Map<String, Value>;

/// Equality filter: every listed field must match exactly. An empty filter matches everything.
pub type Filter = Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort: Option<(String, SortOrder)>,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some((field.into(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Result of a single insert. `acknowledged == false` means the backend accepted the call but
/// cannot confirm the document was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOutcome {
    pub acknowledged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub field: String,
    pub order: SortOrder,
    pub unique: bool,
}

impl IndexSpec {
    pub fn unique(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Ascending,
            unique: true,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Descending,
            unique: false,
        }
    }
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("document could not be encoded: {0}")]
    Serialization(String),
    #[error("stored document is malformed: {0}")]
    Corrupt(String),
    #[error("store connection closed")]
    Closed,
    #[error("unsupported store url scheme '{0}'")]
    UnsupportedScheme(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}

/// Storage abstraction shared by the contact, status-check and health services.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend label for logs.
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
    ) -> Result<InsertOutcome, StoreError>;

    async fn find(
        &self,
        collection: &str,
        filter: Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    async fn find_one(
        &self,
        collection: &str,
        filter: Filter,
    ) -> Result<Option<Document>, StoreError> {
        let mut found = self
            .find(collection, filter, FindOptions::default().limit(1))
            .await?;
        Ok(found.pop())
    }

    /// Sets the given fields on the first document matching `filter`.
    async fn update_one(
        &self,
        collection: &str,
        filter: Filter,
        set: Document,
    ) -> Result<UpdateOutcome, StoreError>;

    async fn create_index(&self, collection: &str, index: IndexSpec) -> Result<(), StoreError>;

    /// Releases the underlying connection. Later calls fail with [`StoreError::Closed`].
    async fn close(&self) -> Result<(), StoreError>;
}

/// Opens the store selected by the connection string.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    if config.is_in_memory() {
        return Ok(Arc::new(InMemoryDocumentStore::new(config.database.clone())));
    }

    let scheme = config.url.split("://").next().unwrap_or_default();
    match scheme {
        #[cfg(feature = "mongodb")]
        "mongodb" | "mongodb+srv" => Ok(Arc::new(MongoDocumentStore::connect(config).await?)),
        other => Err(StoreError::UnsupportedScheme(other.to_string())),
    }
}

/// Fixed-precision RFC 3339 timestamps.
///
/// Backends compare stored strings byte by byte, so every value carries exactly six fractional
/// digits and a `Z` suffix.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::Serializer;

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(value))
    }
}

/// Builds a single-field equality filter.
pub fn filter_eq(field: &str, value: impl Into<Value>) -> Filter {
    let mut filter = Filter::new();
    filter.insert(field.to_string(), value.into());
    filter
}

/// Serializes a record into a storable document.
pub fn encode<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(document) => Ok(document),
        other => Err(StoreError::Serialization(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Decodes a stored document, rejecting anything that no longer fits the record type.
pub fn decode<T: DeserializeOwned>(document: Document) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(document))
        .map_err(|err| StoreError::Corrupt(err.to_string()))
}

/// Total order over JSON values used for in-process sorting.
///
/// Missing < null < bool < number < string; strings that both parse as RFC 3339 timestamps
/// compare chronologically so differing fractional precision does not skew the order.
pub(crate) fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(Value::Array(_)) => 5,
            Some(Value::Object(_)) => 6,
        }
    }

    match (left, right) {
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let a = a.as_f64().unwrap_or_default();
            let b = b.as_f64().unwrap_or_default();
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => {
            match (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b)) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.cmp(b),
            }
        }
        _ => rank(left).cmp(&rank(right)),
    }
}

pub(crate) fn sort_documents(documents: &mut [Document], field: &str, order: SortOrder) {
    documents.sort_by(|a, b| order.apply(compare_values(a.get(field), b.get(field))));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn timestamps_sort_chronologically_across_precisions() {
        let mut documents = vec![
            doc(json!({ "id": "a", "createdAt": "2025-10-01T12:00:00Z" })),
            doc(json!({ "id": "b", "createdAt": "2025-10-01T12:00:00.500Z" })),
            doc(json!({ "id": "c", "createdAt": "2025-09-30T23:59:59.999999Z" })),
        ];

        sort_documents(&mut documents, "createdAt", SortOrder::Descending);

        let ids: Vec<&str> = documents
            .iter()
            .filter_map(|d| d.get("id").and_then(Value::as_str))
            .collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn missing_fields_sort_first_ascending() {
        let mut documents = vec![
            doc(json!({ "id": "with", "rank": 2 })),
            doc(json!({ "id": "without" })),
            doc(json!({ "id": "low", "rank": 1 })),
        ];

        sort_documents(&mut documents, "rank", SortOrder::Ascending);

        assert_eq!(documents[0].get("id"), Some(&json!("without")));
        assert_eq!(documents[1].get("id"), Some(&json!("low")));
    }

    #[tokio::test]
    async fn connect_rejects_unknown_schemes() {
        let config = StoreConfig {
            url: "postgres://localhost/portfolio".to_string(),
            database: "portfolio".to_string(),
        };
        match connect(&config).await {
            Err(StoreError::UnsupportedScheme(scheme)) => assert_eq!(scheme, "postgres"),
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("postgres urls are not a document store"),
        }
    }

    #[tokio::test]
    async fn connect_opens_memory_store() {
        let config = StoreConfig {
            url: "memory://local".to_string(),
            database: "portfolio".to_string(),
        };
        let store = connect(&config).await.expect("memory store opens");
        assert_eq!(store.backend(), "memory");
        store.ping().await.expect("memory store answers ping");
    }
}
