//! Outbound notifications for new contact submissions.
//!
//! The request path only enqueues; delivery happens on a separate worker task. Email and
//! WhatsApp transports are not wired up, so the worker logs the messages it would send.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::info;

use super::domain::{ContactId, ContactRecord, ExperienceLevel};

/// Payload handed to the delivery worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactNotification {
    pub contact_id: ContactId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub experience: Option<ExperienceLevel>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ContactNotification {
    pub fn from_record(record: &ContactRecord) -> Self {
        Self {
            contact_id: record.id.clone(),
            name: record.name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            experience: record.experience,
            message: record.message.clone(),
            created_at: record.created_at,
        }
    }

    pub fn email_subject(&self) -> String {
        format!("New chess coaching enquiry from {}", self.name)
    }

    pub fn whatsapp_body(&self) -> String {
        let experience = self
            .experience
            .map(ExperienceLevel::description)
            .unwrap_or("Not specified");
        let phone = self.phone.as_deref().unwrap_or("not provided");
        format!(
            "New contact: {name} <{email}>, phone {phone}. Experience: {experience}.\n{message}",
            name = self.name,
            email = self.email,
            message = self.message,
        )
    }
}

/// Trait describing outbound notification hooks (queue, e-mail or messaging adapters).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: ContactNotification) -> Result<(), NotificationError>;
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification queue is full")]
    QueueFull,
    #[error("notification worker has shut down")]
    Disconnected,
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Publisher that enqueues onto a bounded channel without ever waiting.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::Sender<ContactNotification>,
}

impl ChannelNotifier {
    /// Creates the publisher together with the worker that drains it.
    pub fn channel(capacity: usize) -> (Self, NotificationWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, NotificationWorker { receiver })
    }
}

impl NotificationPublisher for ChannelNotifier {
    fn publish(&self, notification: ContactNotification) -> Result<(), NotificationError> {
        self.sender
            .try_send(notification)
            .map_err(|err| match err {
                TrySendError::Full(_) => NotificationError::QueueFull,
                TrySendError::Closed(_) => NotificationError::Disconnected,
            })
    }
}

/// Consumes queued notifications until every publisher has been dropped.
#[derive(Debug)]
pub struct NotificationWorker {
    receiver: mpsc::Receiver<ContactNotification>,
}

impl NotificationWorker {
    /// Returns the number of notifications handled.
    pub async fn run(mut self) -> u64 {
        let mut delivered = 0;
        while let Some(notification) = self.receiver.recv().await {
            deliver(&notification);
            delivered += 1;
        }
        info!(delivered, "notification worker drained");
        delivered
    }
}

fn deliver(notification: &ContactNotification) {
    info!(
        contact_id = %notification.contact_id,
        subject = %notification.email_subject(),
        reply_to = %notification.email,
        "email notification prepared (delivery not configured)"
    );
    info!(
        contact_id = %notification.contact_id,
        body = %notification.whatsapp_body(),
        "whatsapp notification prepared (delivery not configured)"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::domain::ContactStatus;
    use chrono::TimeZone;

    fn record(id: &str) -> ContactRecord {
        ContactRecord {
            id: ContactId(id.to_string()),
            name: "Sarah Johnson".to_string(),
            email: "sarah@x.com".to_string(),
            phone: None,
            experience: Some(ExperienceLevel::BasicKnowledge),
            message: "I want to learn chess tactics and openings".to_string(),
            status: ContactStatus::New,
            created_at: Utc
                .with_ymd_and_hms(2025, 10, 1, 9, 30, 0)
                .single()
                .expect("valid timestamp"),
        }
    }

    #[test]
    fn full_queue_is_reported_not_awaited() {
        let (notifier, _worker) = ChannelNotifier::channel(1);
        notifier
            .publish(ContactNotification::from_record(&record("c-1")))
            .expect("first fits");

        match notifier.publish(ContactNotification::from_record(&record("c-2"))) {
            Err(NotificationError::QueueFull) => {}
            other => panic!("expected full queue, got {other:?}"),
        }
    }

    #[test]
    fn dropped_worker_disconnects_publisher() {
        let (notifier, worker) = ChannelNotifier::channel(4);
        drop(worker);

        assert!(matches!(
            notifier.publish(ContactNotification::from_record(&record("c-1"))),
            Err(NotificationError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn worker_drains_until_publishers_drop() {
        let (notifier, worker) = ChannelNotifier::channel(8);
        for id in ["c-1", "c-2", "c-3"] {
            notifier
                .publish(ContactNotification::from_record(&record(id)))
                .expect("enqueue");
        }
        drop(notifier);

        assert_eq!(worker.run().await, 3);
    }

    #[test]
    fn message_bodies_describe_the_enquiry() {
        let notification = ContactNotification::from_record(&record("c-1"));
        assert_eq!(
            notification.email_subject(),
            "New chess coaching enquiry from Sarah Johnson"
        );
        let body = notification.whatsapp_body();
        assert!(body.contains("phone not provided"));
        assert!(body.contains("Knows the basic rules"));
    }
}
