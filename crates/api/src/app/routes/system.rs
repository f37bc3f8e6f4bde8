use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::dto;
use crate::app::routes::common::respond;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> impl IntoResponse {
    let permissions = services.warehouse.policy().permissions_for(principal.role());
    Json(dto::WhoAmI {
        user_id: principal.user_id().to_string(),
        username: principal.principal().username.clone(),
        role: principal.role(),
        permissions: dto::permission_names(&permissions),
    })
}

pub async fn dashboard(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    respond(StatusCode::OK, services.warehouse.dashboard(principal.principal()))
}
