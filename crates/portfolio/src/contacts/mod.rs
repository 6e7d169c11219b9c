//! Contact-form intake and review.
//!
//! Submissions are validated, stored with a generated id and `new` status, and announced on
//! the notification queue. The coach lists, opens and marks submissions through the query
//! endpoints; nothing is ever deleted.

pub mod domain;
pub mod notification;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    ContactId, ContactReceipt, ContactRecord, ContactStatus, ContactSubmission,
    ExperienceLevel, NewContact, StatusUpdateRequest,
};
pub use notification::{
    ChannelNotifier, ContactNotification, NotificationError, NotificationPublisher,
    NotificationWorker,
};
pub use repository::{ContactRepository, CONTACTS_COLLECTION};
pub use router::contact_router;
pub use service::{ContactService, ContactServiceError, StatusChange, LIST_LIMIT};
pub use validation::{validate_submission, FieldViolation, ValidationErrors};
