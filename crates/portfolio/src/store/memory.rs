use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::{
    sort_documents, Document, DocumentStore, Filter, FindOptions, IndexSpec, InsertOutcome,
    StoreError, UpdateOutcome,
};

#[derive(Debug, Default)]
struct MemoryCollection {
    documents: Vec<Document>,
    unique_fields: BTreeSet<String>,
}

impl MemoryCollection {
    fn violates_unique(&self, candidate: &Document, skip: Option<usize>) -> Option<&str> {
        self.unique_fields.iter().map(String::as_str).find(|field| {
            let Some(value) = candidate.get(*field) else {
                return false;
            };
            self.documents
                .iter()
                .enumerate()
                .filter(|(position, _)| Some(*position) != skip)
                .any(|(_, existing)| existing.get(*field) == Some(value))
        })
    }
}

/// Process-local store used for development, tests and `memory://` connection strings.
///
/// Each operation holds the collection lock for its whole duration, so single-document
/// updates are atomic.
#[derive(Debug)]
pub struct InMemoryDocumentStore {
    database: String,
    collections: Mutex<HashMap<String, MemoryCollection>>,
    offline: AtomicBool,
    closed: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collections: Mutex::new(HashMap::new()),
            offline: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Simulates losing the connection: every operation fails with `Unavailable` while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Release);
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .get(collection)
            .map(|entries| entries.documents.len())
            .unwrap_or_default())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, MemoryCollection>>, StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        if self.offline.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable(format!(
                "database '{}' is offline",
                self.database
            )));
        }
        self.collections
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

fn matches(document: &Document, filter: &Filter) -> bool {
    filter
        .iter()
        .all(|(field, expected)| document.get(field) == Some(expected))
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
    ) -> Result<InsertOutcome, StoreError> {
        let mut guard = self.lock()?;
        let entries = guard.entry(collection.to_string()).or_default();

        if let Some(field) = entries.violates_unique(&document, None) {
            let value = document.get(field).cloned().unwrap_or(Value::Null);
            return Err(StoreError::DuplicateKey(format!(
                "{collection}.{field} already holds {value}"
            )));
        }

        entries.documents.push(document);
        Ok(InsertOutcome { acknowledged: true })
    }

    async fn find(
        &self,
        collection: &str,
        filter: Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let guard = self.lock()?;
        let Some(entries) = guard.get(collection) else {
            return Ok(Vec::new());
        };

        let mut found: Vec<Document> = entries
            .documents
            .iter()
            .filter(|document| matches(document, &filter))
            .cloned()
            .collect();
        drop(guard);

        if let Some((field, order)) = &options.sort {
            sort_documents(&mut found, field, *order);
        }
        if let Some(limit) = options.limit {
            found.truncate(limit);
        }
        Ok(found)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Filter,
        set: Document,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut guard = self.lock()?;
        let Some(entries) = guard.get_mut(collection) else {
            return Ok(UpdateOutcome {
                matched: 0,
                modified: 0,
            });
        };

        let Some(position) = entries
            .documents
            .iter()
            .position(|document| matches(document, &filter))
        else {
            return Ok(UpdateOutcome {
                matched: 0,
                modified: 0,
            });
        };

        let mut updated = entries.documents[position].clone();
        for (field, value) in set {
            updated.insert(field, value);
        }

        if let Some(field) = entries.violates_unique(&updated, Some(position)) {
            return Err(StoreError::DuplicateKey(format!(
                "{collection}.{field} would collide on update"
            )));
        }

        let modified = u64::from(entries.documents[position] != updated);
        entries.documents[position] = updated;
        Ok(UpdateOutcome {
            matched: 1,
            modified,
        })
    }

    async fn create_index(&self, collection: &str, index: IndexSpec) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let entries = guard.entry(collection.to_string()).or_default();
        if !index.unique {
            return Ok(());
        }

        let mut seen = BTreeSet::new();
        for document in &entries.documents {
            if let Some(value) = document.get(&index.field) {
                if !seen.insert(value.to_string()) {
                    return Err(StoreError::DuplicateKey(format!(
                        "cannot build unique index on {collection}.{}: {value} repeats",
                        index.field
                    )));
                }
            }
        }

        entries.unique_fields.insert(index.field);
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
