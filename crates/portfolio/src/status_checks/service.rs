use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use super::domain::{StatusCheck, StatusCheckCreate};
use crate::contacts::ValidationErrors;
use crate::store::{decode, encode, DocumentStore, Filter, FindOptions, StoreError};

pub const STATUS_CHECKS_COLLECTION: &str = "status_checks";

/// Maximum number of status checks returned by a listing.
pub const STATUS_LIST_LIMIT: usize = 1000;

pub struct StatusCheckService {
    store: Arc<dyn DocumentStore>,
}

impl StatusCheckService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, request: StatusCheckCreate) -> Result<StatusCheck, StatusCheckError> {
        // Any string is a valid client name, the empty one included.
        let Some(client_name) = request.client_name else {
            return Err(ValidationErrors::single("client_name", "client_name is required").into());
        };

        let check = StatusCheck::new(client_name, Utc::now());
        let outcome = self
            .store
            .insert_one(STATUS_CHECKS_COLLECTION, encode(&check)?)
            .await?;
        if !outcome.acknowledged {
            return Err(StatusCheckError::Persistence);
        }
        debug!(status_check_id = %check.id, client = %check.client_name, "status check recorded");
        Ok(check)
    }

    /// Stored checks in insertion order, capped at [`STATUS_LIST_LIMIT`].
    pub async fn list(&self) -> Result<Vec<StatusCheck>, StatusCheckError> {
        let options = FindOptions::default().limit(STATUS_LIST_LIMIT);
        self.store
            .find(STATUS_CHECKS_COLLECTION, Filter::new(), options)
            .await?
            .into_iter()
            .map(|document| decode::<StatusCheck>(document).map_err(StatusCheckError::from))
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StatusCheckError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("status check was not acknowledged by the store")]
    Persistence,
    #[error(transparent)]
    Store(#[from] StoreError),
}
