use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::contacts::domain::ContactSubmission;
use crate::contacts::notification::{
    ContactNotification, NotificationError, NotificationPublisher,
};
use crate::contacts::{contact_router, ContactService};
use crate::store::{
    Document, DocumentStore, Filter, FindOptions, InMemoryDocumentStore, IndexSpec,
    InsertOutcome, StoreError, UpdateOutcome,
};

pub(super) fn submission() -> ContactSubmission {
    ContactSubmission {
        name: Some("Sarah Johnson".to_string()),
        email: Some("sarah.johnson@email.com".to_string()),
        phone: Some("+1-555-0123".to_string()),
        experience: Some("intermediate".to_string()),
        message: Some(
            "I've been playing for about 2 years and would love to work on tactics and openings."
                .to_string(),
        ),
    }
}

pub(super) fn minimal_submission() -> ContactSubmission {
    ContactSubmission {
        name: Some("Sarah Johnson".to_string()),
        email: Some("sarah@x.com".to_string()),
        phone: None,
        experience: None,
        message: Some("I want to learn chess tactics and openings".to_string()),
    }
}

pub(super) fn invalid_submission() -> ContactSubmission {
    ContactSubmission {
        name: Some(String::new()),
        email: Some("bad".to_string()),
        phone: None,
        experience: None,
        message: Some("short".to_string()),
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    events: Arc<Mutex<Vec<ContactNotification>>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<ContactNotification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifier {
    fn publish(&self, notification: ContactNotification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl NotificationPublisher for FailingNotifier {
    fn publish(&self, _notification: ContactNotification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay refused".to_string()))
    }
}

/// Accepts writes without confirming them.
pub(super) struct UnacknowledgedStore;

#[async_trait]
impl DocumentStore for UnacknowledgedStore {
    fn backend(&self) -> &'static str {
        "unacknowledged"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_one(
        &self,
        _collection: &str,
        _document: Document,
    ) -> Result<InsertOutcome, StoreError> {
        Ok(InsertOutcome {
            acknowledged: false,
        })
    }

    async fn find(
        &self,
        _collection: &str,
        _filter: Filter,
        _options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        Ok(Vec::new())
    }

    async fn update_one(
        &self,
        _collection: &str,
        _filter: Filter,
        _set: Document,
    ) -> Result<UpdateOutcome, StoreError> {
        Ok(UpdateOutcome {
            matched: 0,
            modified: 0,
        })
    }

    async fn create_index(&self, _collection: &str, _index: IndexSpec) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub(super) fn memory_store() -> Arc<InMemoryDocumentStore> {
    Arc::new(InMemoryDocumentStore::new("portfolio_test"))
}

pub(super) fn build_service() -> (
    ContactService<MemoryNotifier>,
    Arc<InMemoryDocumentStore>,
    Arc<MemoryNotifier>,
) {
    let store = memory_store();
    let notifier = Arc::new(MemoryNotifier::default());
    let service = ContactService::new(store.clone(), notifier.clone());
    (service, store, notifier)
}

pub(super) fn contact_router_with_service(
    service: ContactService<MemoryNotifier>,
) -> axum::Router {
    contact_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
