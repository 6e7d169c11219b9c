use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ping record left by a client of the legacy status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCheck {
    pub id: String,
    pub client_name: String,
    pub timestamp: DateTime<Utc>,
}

impl StatusCheck {
    pub fn new(client_name: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            client_name,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusCheckCreate {
    #[serde(default, alias = "clientName")]
    pub client_name: Option<String>,
}
