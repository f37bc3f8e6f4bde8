use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use wms_infra::WorkflowResult;

use crate::app::errors;

/// Serialize a workflow result, or map its error to the JSON error body.
pub fn respond<T: Serialize>(status: StatusCode, result: WorkflowResult<T>) -> axum::response::Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

/// Run a workflow call that hashes or verifies a password on the blocking
/// pool instead of an async worker.
pub async fn run_blocking<T, F>(call: F) -> Result<WorkflowResult<T>, axum::response::Response>
where
    F: FnOnce() -> WorkflowResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call).await.map_err(|e| {
        tracing::error!("blocking task failed: {e}");
        errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", "internal error")
    })
}

/// List endpoints wrap their rows as `{ "items": [...] }`.
pub fn respond_list<T: Serialize>(result: WorkflowResult<Vec<T>>) -> axum::response::Response {
    match result {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}
