use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use portfolio::contacts::{contact_router, ContactService, NotificationPublisher};
use portfolio::health::health_router;
use portfolio::status_checks::{status_check_router, StatusCheckService};
use portfolio::store::DocumentStore;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

const GREETING: &str = "Shriram's Portfolio API - Chess Coaching Platform";

#[derive(Debug, Serialize)]
pub(crate) struct Greeting {
    pub(crate) message: &'static str,
}

pub(crate) fn with_api_routes<N>(
    contacts: Arc<ContactService<N>>,
    status_checks: Arc<StatusCheckService>,
    store: Arc<dyn DocumentStore>,
) -> Router
where
    N: NotificationPublisher + 'static,
{
    contact_router(contacts)
        .merge(status_check_router(status_checks))
        .merge(health_router(store))
        .route("/api", get(root_greeting))
        .route("/api/", get(root_greeting))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn root_greeting() -> Json<Greeting> {
    Json(Greeting { message: GREETING })
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
