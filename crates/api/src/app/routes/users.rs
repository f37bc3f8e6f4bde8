use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use wms_core::UserId;
use wms_infra::{UserChanges, WorkflowError};

use crate::app::routes::common::{respond, respond_list, run_blocking};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", patch(update_user).delete(delete_user))
        .route("/:id/password", post(reset_password))
}

fn parse_user_id(id: &str) -> Result<UserId, axum::response::Response> {
    id.parse::<UserId>()
        .map_err(|e| errors::workflow_error_to_response(WorkflowError::from(e)))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    respond_list(services.warehouse.list_users(principal.principal()))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateUserRequest>,
) -> axum::response::Response {
    let created = run_blocking(move || {
        services.warehouse.create_user(
            principal.principal(),
            &body.username,
            &body.password,
            body.role,
        )
    })
    .await;
    match created {
        Ok(result) => respond(StatusCode::CREATED, result),
        Err(res) => res,
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<UserChanges>,
) -> axum::response::Response {
    let user_id = match parse_user_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    respond(
        StatusCode::OK,
        services.warehouse.update_user(principal.principal(), user_id, body),
    )
}

pub async fn reset_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ResetPasswordRequest>,
) -> axum::response::Response {
    let user_id = match parse_user_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let reset = run_blocking(move || {
        services
            .warehouse
            .reset_password(principal.principal(), user_id, &body.password)
    })
    .await;
    match reset {
        Ok(result) => respond(StatusCode::OK, result),
        Err(res) => res,
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let user_id = match parse_user_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.warehouse.delete_user(principal.principal(), user_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}
