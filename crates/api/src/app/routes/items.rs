use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use wms_infra::{ItemChanges, NewItem};

use crate::app::dto;
use crate::app::routes::common::{respond, respond_list};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:sku", get(get_item).patch(update_item))
        .route("/:sku/movements", get(item_movements))
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewItem>,
) -> axum::response::Response {
    respond(
        StatusCode::CREATED,
        services.warehouse.create_item(principal.principal(), body),
    )
}

/// `?q=` filters by SKU, name or barcode.
pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::SearchQuery>,
) -> axum::response::Response {
    respond_list(
        services
            .warehouse
            .list_items(principal.principal(), query.q.as_deref()),
    )
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(sku): Path<String>,
) -> axum::response::Response {
    respond(StatusCode::OK, services.warehouse.get_item(principal.principal(), &sku))
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(sku): Path<String>,
    Json(body): Json<ItemChanges>,
) -> axum::response::Response {
    respond(
        StatusCode::OK,
        services.warehouse.update_item(principal.principal(), &sku, body),
    )
}

pub async fn item_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(sku): Path<String>,
) -> axum::response::Response {
    respond_list(services.warehouse.item_movements(principal.principal(), &sku))
}
