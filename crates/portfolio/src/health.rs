//! Liveness probe backed by a store ping.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use crate::store::DocumentStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
    pub database: &'static str,
}

impl HealthReport {
    fn healthy() -> Self {
        Self {
            status: "healthy",
            message: "API is running successfully",
            timestamp: Utc::now(),
            database: "connected",
        }
    }

    fn unhealthy() -> Self {
        Self {
            status: "unhealthy",
            message: "Service unavailable - database connection failed",
            timestamp: Utc::now(),
            database: "disconnected",
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.database == "connected"
    }
}

/// Pings the store and reports the outcome. Failures are logged, never returned.
pub async fn check(store: &dyn DocumentStore) -> HealthReport {
    match store.ping().await {
        Ok(()) => HealthReport::healthy(),
        Err(err) => {
            error!(backend = store.backend(), error = %err, "health check failed");
            HealthReport::unhealthy()
        }
    }
}

pub fn health_router(store: Arc<dyn DocumentStore>) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .with_state(store)
}

pub(crate) async fn health_handler(
    State(store): State<Arc<dyn DocumentStore>>,
) -> (StatusCode, Json<HealthReport>) {
    let report = check(store.as_ref()).await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}
