use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use wms_core::DomainError;
use wms_infra::WorkflowError;
use wms_infra::event_store::EventStoreError;

/// HTTP status for a domain failure.
pub fn domain_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(_) | DomainError::InvalidId(_) => StatusCode::BAD_REQUEST,
        DomainError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        DomainError::SelfDeletion => StatusCode::FORBIDDEN,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::DuplicateRef(_) | DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::InsufficientStock { .. }
        | DomainError::IncompleteLines { .. }
        | DomainError::InvariantViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

pub fn workflow_error_to_response(err: WorkflowError) -> axum::response::Response {
    let status = match &err {
        WorkflowError::Domain(e) => domain_status(e),
        WorkflowError::Forbidden(_) => StatusCode::FORBIDDEN,
        WorkflowError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        WorkflowError::Store(EventStoreError::Concurrency(_)) => StatusCode::CONFLICT,
        WorkflowError::Store(_)
        | WorkflowError::Deserialize(_)
        | WorkflowError::Hash(_)
        | WorkflowError::Projection(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
        return json_error(status, err.code(), "internal error");
    }

    match &err {
        WorkflowError::Domain(DomainError::IncompleteLines { lines, .. }) => (
            status,
            axum::Json(json!({
                "error": err.code(),
                "message": err.to_string(),
                "lines": lines,
            })),
        )
            .into_response(),
        _ => json_error(status, err.code(), err.to_string()),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_kind() {
        assert_eq!(domain_status(&DomainError::validation("x")), StatusCode::BAD_REQUEST);
        assert_eq!(domain_status(&DomainError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(domain_status(&DomainError::SelfDeletion), StatusCode::FORBIDDEN);
        assert_eq!(domain_status(&DomainError::duplicate("x")), StatusCode::CONFLICT);
        assert_eq!(
            domain_status(&DomainError::InsufficientStock {
                sku: "SKU-001".into(),
                requested: 2,
                on_hand: 1
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn vanished_users_are_unauthorized() {
        let res = workflow_error_to_response(WorkflowError::Unauthenticated("gone".into()));
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn lost_races_are_conflicts() {
        let res = workflow_error_to_response(EventStoreError::Concurrency("stale".into()).into());
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let res = workflow_error_to_response(EventStoreError::InvalidAppend("bad".into()).into());
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
