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
        .route("/", get(list_orders).post(create_order))
        .route("/:order_ref", get(get_order))
        .route("/:order_ref/lines", post(add_line))
        .route("/:order_ref/lines/:line_no/pick", post(pick_line))
        .route("/:order_ref/pack", post(pack_order))
        .route("/:order_ref/ship", post(ship_order))
        .route("/:order_ref/close", post(close_order))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    respond(
        StatusCode::CREATED,
        services
            .warehouse
            .create_order(principal.principal(), &body.order_ref, body.customer),
    )
}

/// Newest first.
pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    respond_list(services.warehouse.list_orders(principal.principal()))
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(order_ref): Path<String>,
) -> axum::response::Response {
    respond(
        StatusCode::OK,
        services.warehouse.get_order(principal.principal(), &order_ref),
    )
}

pub async fn add_line(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(order_ref): Path<String>,
    Json(body): Json<dto::AddLineRequest>,
) -> axum::response::Response {
    respond(
        StatusCode::CREATED,
        services
            .warehouse
            .add_order_line(principal.principal(), &order_ref, &body.sku, body.qty),
    )
}

pub async fn pick_line(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((order_ref, line_no)): Path<(String, u32)>,
    Json(body): Json<dto::QtyRequest>,
) -> axum::response::Response {
    respond(
        StatusCode::OK,
        services
            .warehouse
            .pick_order_line(principal.principal(), &order_ref, line_no, body.qty),
    )
}

pub async fn pack_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(order_ref): Path<String>,
) -> axum::response::Response {
    respond(
        StatusCode::OK,
        services.warehouse.pack_order(principal.principal(), &order_ref),
    )
}

/// The body is optional; carrier and tracking number may both be omitted.
pub async fn ship_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(order_ref): Path<String>,
    body: Option<Json<dto::ShipRequest>>,
) -> axum::response::Response {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    respond(
        StatusCode::OK,
        services.warehouse.ship_order(
            principal.principal(),
            &order_ref,
            body.carrier,
            body.tracking_no,
        ),
    )
}

pub async fn close_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(order_ref): Path<String>,
) -> axum::response::Response {
    respond(
        StatusCode::OK,
        services.warehouse.close_order(principal.principal(), &order_ref),
    )
}
