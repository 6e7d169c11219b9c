use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde_json::json;
use tracing::error;

use super::domain::{ContactId, ContactSubmission, StatusUpdateRequest};
use super::notification::NotificationPublisher;
use super::service::{ContactService, ContactServiceError};
use super::validation::ValidationErrors;

const SUBMITTED_MESSAGE: &str =
    "Thank you for reaching out! Your message has been received and I'll get back to you soon.";

/// Router builder exposing contact intake and the coach's review endpoints.
pub fn contact_router<N>(service: Arc<ContactService<N>>) -> Router
where
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/contacts",
            get(list_handler::<N>).post(submit_handler::<N>),
        )
        .route("/api/contacts/:contact_id", get(detail_handler::<N>))
        .route(
            "/api/contacts/:contact_id/status",
            put(status_update_handler::<N>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<N>(
    State(service): State<Arc<ContactService<N>>>,
    payload: Result<Json<ContactSubmission>, JsonRejection>,
) -> Response
where
    N: NotificationPublisher + 'static,
{
    let submission = match payload {
        Ok(Json(submission)) => submission,
        Err(rejection) => return malformed_body(&rejection),
    };

    match service.submit(submission).await {
        Ok(receipt) => {
            let payload = json!({
                "success": true,
                "message": SUBMITTED_MESSAGE,
                "data": receipt,
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<N>(State(service): State<Arc<ContactService<N>>>) -> Response
where
    N: NotificationPublisher + 'static,
{
    match service.list().await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn detail_handler<N>(
    State(service): State<Arc<ContactService<N>>>,
    Path(contact_id): Path<String>,
) -> Response
where
    N: NotificationPublisher + 'static,
{
    match service.get(&ContactId(contact_id)).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_update_handler<N>(
    State(service): State<Arc<ContactService<N>>>,
    Path(contact_id): Path<String>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Response
where
    N: NotificationPublisher + 'static,
{
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return malformed_body(&rejection),
    };

    match service
        .update_status(&ContactId(contact_id), request)
        .await
    {
        Ok(change) => {
            let payload = json!({
                "success": true,
                "message": format!("Contact status updated to {}", change.status.label()),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn malformed_body(rejection: &JsonRejection) -> Response {
    validation_response(&ValidationErrors::single("body", rejection.body_text()))
}

fn validation_response(errors: &ValidationErrors) -> Response {
    let payload = json!({
        "success": false,
        "message": "Validation failed",
        "errors": errors,
    });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

fn failure(status: StatusCode, message: &str) -> Response {
    let payload = json!({
        "success": false,
        "message": message,
    });
    (status, Json(payload)).into_response()
}

fn error_response(err: ContactServiceError) -> Response {
    match err {
        ContactServiceError::Validation(errors) => validation_response(&errors),
        ContactServiceError::NotFound(_) => {
            failure(StatusCode::NOT_FOUND, "Contact submission not found")
        }
        ContactServiceError::Persistence => {
            error!("contact submission insert was not acknowledged");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save contact submission",
            )
        }
        ContactServiceError::Unexpected(source) => {
            error!(error = %source, "contact request failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
