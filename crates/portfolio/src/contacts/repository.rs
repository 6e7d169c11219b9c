use std::sync::Arc;

use crate::store::{
    decode, encode, filter_eq, Document, DocumentStore, Filter, FindOptions, IndexSpec,
    InsertOutcome, SortOrder, StoreError, UpdateOutcome,
};

use super::domain::{ContactId, ContactRecord, ContactStatus};

pub const CONTACTS_COLLECTION: &str = "contact_submissions";

/// Typed access to the contact collection on top of the shared document store.
#[derive(Clone)]
pub struct ContactRepository {
    store: Arc<dyn DocumentStore>,
}

impl ContactRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        self.store
            .create_index(CONTACTS_COLLECTION, IndexSpec::unique("id"))
            .await?;
        self.store
            .create_index(CONTACTS_COLLECTION, IndexSpec::descending("createdAt"))
            .await
    }

    pub async fn insert(&self, record: &ContactRecord) -> Result<InsertOutcome, StoreError> {
        self.store
            .insert_one(CONTACTS_COLLECTION, encode(record)?)
            .await
    }

    /// Newest first, at most `limit` records.
    pub async fn list(&self, limit: usize) -> Result<Vec<ContactRecord>, StoreError> {
        let options = FindOptions::default()
            .sort_by("createdAt", SortOrder::Descending)
            .limit(limit);
        self.store
            .find(CONTACTS_COLLECTION, Filter::new(), options)
            .await?
            .into_iter()
            .map(decode::<ContactRecord>)
            .collect()
    }

    pub async fn fetch(&self, id: &ContactId) -> Result<Option<ContactRecord>, StoreError> {
        self.store
            .find_one(CONTACTS_COLLECTION, filter_eq("id", id.as_str()))
            .await?
            .map(decode::<ContactRecord>)
            .transpose()
    }

    pub async fn update_status(
        &self,
        id: &ContactId,
        status: ContactStatus,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut set = Document::new();
        set.insert("status".to_string(), status.label().into());
        self.store
            .update_one(CONTACTS_COLLECTION, filter_eq("id", id.as_str()), set)
            .await
    }
}
