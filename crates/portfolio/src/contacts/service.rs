use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    ContactId, ContactReceipt, ContactRecord, ContactStatus, ContactSubmission,
    StatusUpdateRequest,
};
use super::notification::{ContactNotification, NotificationPublisher};
use super::repository::ContactRepository;
use super::validation::{validate_status_update, validate_submission, ValidationErrors};
use crate::store::{DocumentStore, StoreError};

/// Maximum number of submissions returned by a listing.
pub const LIST_LIMIT: usize = 1000;

/// Service composing validation, persistence and the notification hook.
pub struct ContactService<N> {
    repository: ContactRepository,
    notifier: Arc<N>,
    last_created_micros: AtomicI64,
}

impl<N> ContactService<N>
where
    N: NotificationPublisher + 'static,
{
    pub fn new(store: Arc<dyn DocumentStore>, notifier: Arc<N>) -> Self {
        Self {
            repository: ContactRepository::new(store),
            notifier,
            last_created_micros: AtomicI64::new(i64::MIN),
        }
    }

    /// Validate, persist and announce a new submission.
    pub async fn submit(
        &self,
        submission: ContactSubmission,
    ) -> Result<ContactReceipt, ContactServiceError> {
        let contact = validate_submission(submission)?;
        let record =
            ContactRecord::from_new(contact, ContactId::generate(), self.next_created_at());

        let outcome = self.repository.insert(&record).await?;
        if !outcome.acknowledged {
            return Err(ContactServiceError::Persistence);
        }
        info!(contact_id = %record.id, "contact submission stored");

        if let Err(err) = self
            .notifier
            .publish(ContactNotification::from_record(&record))
        {
            warn!(contact_id = %record.id, error = %err, "contact notification dropped");
        }

        Ok(record.receipt())
    }

    /// Every submission, newest first, capped at [`LIST_LIMIT`].
    pub async fn list(&self) -> Result<Vec<ContactRecord>, ContactServiceError> {
        Ok(self.repository.list(LIST_LIMIT).await?)
    }

    pub async fn get(&self, id: &ContactId) -> Result<ContactRecord, ContactServiceError> {
        self.repository
            .fetch(id)
            .await?
            .ok_or_else(|| ContactServiceError::NotFound(id.clone()))
    }

    /// Changes only the `status` field of an existing submission.
    pub async fn update_status(
        &self,
        id: &ContactId,
        request: StatusUpdateRequest,
    ) -> Result<StatusChange, ContactServiceError> {
        let status = validate_status_update(request)?;
        let outcome = self.repository.update_status(id, status).await?;
        if outcome.matched == 0 {
            return Err(ContactServiceError::NotFound(id.clone()));
        }

        info!(contact_id = %id, status = status.label(), "contact status updated");
        Ok(StatusChange {
            id: id.clone(),
            status,
        })
    }

    // Strictly increasing at microsecond resolution, even if the wall clock steps back.
    fn next_created_at(&self) -> DateTime<Utc> {
        let now = Utc::now().timestamp_micros();
        let next = |previous: i64| now.max(previous.saturating_add(1));
        let assigned = match self.last_created_micros.fetch_update(
            Ordering::AcqRel,
            Ordering::Acquire,
            |previous| Some(next(previous)),
        ) {
            Ok(previous) | Err(previous) => next(previous),
        };
        DateTime::from_timestamp_micros(assigned).unwrap_or_else(Utc::now)
    }
}

/// Confirmation of an applied status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub id: ContactId,
    pub status: ContactStatus,
}

/// Error raised by the contact service.
#[derive(Debug, thiserror::Error)]
pub enum ContactServiceError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("contact submission {0} not found")]
    NotFound(ContactId),
    #[error("contact submission was not acknowledged by the store")]
    Persistence,
    #[error(transparent)]
    Unexpected(#[from] StoreError),
}
