use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for contact submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(pub String);

impl ContactId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw contact-form payload as posted by the site.
///
/// Every field is optional at this layer so missing values surface as validation violations
/// rather than deserialization failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, alias = "experienceLevel")]
    pub experience: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Self-reported chess background offered by the contact form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExperienceLevel {
    CompleteBeginner,
    BasicKnowledge,
    Intermediate,
    Advanced,
    Competitive,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 5] = [
        ExperienceLevel::CompleteBeginner,
        ExperienceLevel::BasicKnowledge,
        ExperienceLevel::Intermediate,
        ExperienceLevel::Advanced,
        ExperienceLevel::Competitive,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ExperienceLevel::CompleteBeginner => "complete-beginner",
            ExperienceLevel::BasicKnowledge => "basic-knowledge",
            ExperienceLevel::Intermediate => "intermediate",
            ExperienceLevel::Advanced => "advanced",
            ExperienceLevel::Competitive => "competitive",
        }
    }

    /// Human wording used in outbound notifications.
    pub const fn description(self) -> &'static str {
        match self {
            ExperienceLevel::CompleteBeginner => "Complete beginner",
            ExperienceLevel::BasicKnowledge => "Knows the basic rules",
            ExperienceLevel::Intermediate => "Intermediate club player",
            ExperienceLevel::Advanced => "Advanced player",
            ExperienceLevel::Competitive => "Competitive / tournament player",
        }
    }
}

impl FromStr for ExperienceLevel {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.label() == value)
            .ok_or_else(|| UnknownVariant(value.to_string()))
    }
}

/// Lifecycle of a submission as handled by the coach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    #[default]
    New,
    Read,
    Replied,
}

impl ContactStatus {
    pub const ALL: [ContactStatus; 3] = [
        ContactStatus::New,
        ContactStatus::Read,
        ContactStatus::Replied,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ContactStatus::New => "new",
            ContactStatus::Read => "read",
            ContactStatus::Replied => "replied",
        }
    }
}

impl FromStr for ContactStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.label() == value.trim())
            .ok_or_else(|| UnknownVariant(value.to_string()))
    }
}

/// Raised when a string does not name a known enumeration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value '{0}'")]
pub struct UnknownVariant(pub String);

/// Normalized, validated submission ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub experience: Option<ExperienceLevel>,
    pub message: String,
}

/// Persisted contact submission, also the shape returned by the query endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub id: ContactId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<ExperienceLevel>,
    pub message: String,
    pub status: ContactStatus,
    #[serde(serialize_with = "crate::store::timestamp::serialize")]
    pub created_at: DateTime<Utc>,
}

impl ContactRecord {
    pub fn from_new(contact: NewContact, id: ContactId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            experience: contact.experience,
            message: contact.message,
            status: ContactStatus::New,
            created_at,
        }
    }

    pub fn receipt(&self) -> ContactReceipt {
        ContactReceipt {
            id: self.id.clone(),
            created_at: self.created_at,
        }
    }
}

/// Data returned to the submitter after a successful intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactReceipt {
    pub id: ContactId,
    #[serde(serialize_with = "crate::store::timestamp::serialize")]
    pub created_at: DateTime<Utc>,
}

/// Body of the status update endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(default, rename = "newStatus", alias = "new_status", alias = "status")]
    pub new_status: Option<String>,
}
