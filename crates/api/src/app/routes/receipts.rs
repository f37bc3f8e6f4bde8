use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::app::dto;
use crate::app::routes::common::{respond, respond_list};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_receipts).post(create_receipt))
        .route("/:receipt_ref", get(get_receipt))
        .route("/:receipt_ref/lines", post(add_line))
        .route("/:receipt_ref/lines/:line_no/receive", post(receive_line))
        .route("/:receipt_ref/close", post(close_receipt))
}

pub async fn create_receipt(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateReceiptRequest>,
) -> axum::response::Response {
    respond(
        StatusCode::CREATED,
        services
            .warehouse
            .create_receipt(principal.principal(), &body.receipt_ref, body.vendor),
    )
}

/// Newest first.
pub async fn list_receipts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    respond_list(services.warehouse.list_receipts(principal.principal()))
}

pub async fn get_receipt(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(receipt_ref): Path<String>,
) -> axum::response::Response {
    respond(
        StatusCode::OK,
        services.warehouse.get_receipt(principal.principal(), &receipt_ref),
    )
}

pub async fn add_line(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(receipt_ref): Path<String>,
    Json(body): Json<dto::AddLineRequest>,
) -> axum::response::Response {
    respond(
        StatusCode::CREATED,
        services
            .warehouse
            .add_receipt_line(principal.principal(), &receipt_ref, &body.sku, body.qty),
    )
}

pub async fn receive_line(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((receipt_ref, line_no)): Path<(String, u32)>,
    Json(body): Json<dto::QtyRequest>,
) -> axum::response::Response {
    respond(
        StatusCode::OK,
        services
            .warehouse
            .receive_receipt_line(principal.principal(), &receipt_ref, line_no, body.qty),
    )
}

pub async fn close_receipt(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(receipt_ref): Path<String>,
) -> axum::response::Response {
    respond(
        StatusCode::OK,
        services.warehouse.close_receipt(principal.principal(), &receipt_ref),
    )
}
