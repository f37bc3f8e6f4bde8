use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::routes::common::run_blocking;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    let verifier = services.clone();
    let verified =
        run_blocking(move || verifier.warehouse.authenticate(&body.username, &body.password)).await;
    let principal = match verified {
        Ok(Ok(p)) => p,
        Ok(Err(e)) => return errors::workflow_error_to_response(e),
        Err(res) => return res,
    };

    let token = match services.issue_token(&principal) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("failed to sign token: {e}");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "could not issue token",
            );
        }
    };

    (
        StatusCode::OK,
        Json(dto::LoginResponse {
            token,
            user: principal,
        }),
    )
        .into_response()
}

pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::ChangePasswordRequest>,
) -> axum::response::Response {
    let changed = run_blocking(move || {
        services.warehouse.change_own_password(
            principal.principal(),
            &body.old_password,
            &body.new_password,
        )
    })
    .await;
    match changed {
        Ok(Ok(())) => StatusCode::NO_CONTENT.into_response(),
        Ok(Err(e)) => errors::workflow_error_to_response(e),
        Err(res) => res,
    }
}
