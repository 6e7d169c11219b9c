use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::error;

use super::domain::{StatusCheck, StatusCheckCreate};
use super::service::{StatusCheckError, StatusCheckService};
use crate::contacts::ValidationErrors;

pub fn status_check_router(service: Arc<StatusCheckService>) -> Router {
    Router::new()
        .route("/api/status", get(list_handler).post(create_handler))
        .with_state(service)
}

pub(crate) async fn create_handler(
    State(service): State<Arc<StatusCheckService>>,
    payload: Result<Json<StatusCheckCreate>, JsonRejection>,
) -> Result<Json<StatusCheck>, StatusCheckError> {
    let Json(request) = payload.map_err(|rejection| {
        StatusCheckError::Validation(ValidationErrors::single("body", rejection.body_text()))
    })?;
    Ok(Json(service.create(request).await?))
}

pub(crate) async fn list_handler(
    State(service): State<Arc<StatusCheckService>>,
) -> Result<Json<Vec<StatusCheck>>, StatusCheckError> {
    Ok(Json(service.list().await?))
}

impl IntoResponse for StatusCheckError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            StatusCheckError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "message": "Validation failed", "errors": errors }),
            ),
            StatusCheckError::Persistence | StatusCheckError::Store(_) => {
                error!(error = %self, "status check request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "message": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
