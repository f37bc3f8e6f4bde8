use serde::{Deserialize, Serialize};

use wms_auth::{Permission, Principal, Role};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReceiptRequest {
    #[serde(rename = "ref")]
    pub receipt_ref: String,
    #[serde(default)]
    pub vendor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(rename = "ref")]
    pub order_ref: String,
    #[serde(default)]
    pub customer: Option<String>,
}

/// A new receipt or order line.
#[derive(Debug, Deserialize)]
pub struct AddLineRequest {
    pub sku: String,
    pub qty: i64,
}

/// Body of receive/pick calls.
#[derive(Debug, Deserialize)]
pub struct QtyRequest {
    pub qty: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShipRequest {
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub tracking_no: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Principal,
}

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    pub permissions: Vec<&'static str>,
}

pub fn permission_names(permissions: &[Permission]) -> Vec<&'static str> {
    permissions.iter().map(|p| p.as_str()).collect()
}
