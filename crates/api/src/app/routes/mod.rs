use axum::{
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod common;
pub mod items;
pub mod orders;
pub mod receipts;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/dashboard", get(system::dashboard))
        .route("/account/password", post(auth::change_password))
        .nest("/items", items::router())
        .nest("/receipts", receipts::router())
        .nest("/orders", orders::router())
        .nest("/users", users::router())
}
