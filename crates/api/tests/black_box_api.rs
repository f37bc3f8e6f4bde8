use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};

use wms_auth::{JwtClaims, Principal, Role};
use wms_core::UserId;
use wms_infra::WmsConfig;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Seeded demo warehouse, bound to an ephemeral port.
    async fn spawn() -> Self {
        let config = WmsConfig {
            jwt_secret: JWT_SECRET.to_string(),
            bcrypt_cost: 4,
            ..WmsConfig::default()
        };
        let app = wms_api::app::build_app(config).await.expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "login as {username}");
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn get(&self, token: &str, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).bearer_auth(token).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str, role: Role) -> String {
    let principal = Principal::new(UserId::new(), "forged", role);
    let claims = JwtClaims::for_principal(&principal, Utc::now(), ChronoDuration::minutes(10));

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    let forged = mint_jwt("some-other-secret", Role::Admin);
    let (status, _) = srv.get(&forged, "/items").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bad_credentials_are_401() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .post(srv.url("/auth/login"))
        .json(&json!({ "username": "admin", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_credentials");
}

#[tokio::test]
async fn whoami_reflects_the_token() {
    let srv = TestServer::spawn().await;
    let token = srv.login("picker", "picker123").await;

    let (status, body) = srv.get(&token, "/whoami").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "picker");
    assert_eq!(body["role"], "picker");
    let perms = body["permissions"].as_array().unwrap();
    assert!(perms.iter().any(|p| p == "orders.pick_line"));
    assert!(!perms.iter().any(|p| p == "orders.pack"));
}

#[tokio::test]
async fn picking_moves_stock_and_rejects_overdraw() {
    let srv = TestServer::spawn().await;
    let token = srv.login("picker", "picker123").await;

    let (status, order) = srv.post(&token, "/orders/ORD-001/lines/1/pick", json!({ "qty": 5 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "picking");
    assert_eq!(order["lines"][0]["picked_qty"], 5);

    let (_, item) = srv.get(&token, "/items/SKU-001").await;
    assert_eq!(item["on_hand"], 95);

    let (status, err) = srv.post(&token, "/orders/ORD-001/lines/1/pick", json!({ "qty": 96 })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"], "insufficient_stock");

    let (_, movements) = srv.get(&token, "/items/SKU-001/movements").await;
    assert_eq!(movements["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn role_table_is_enforced_over_http() {
    let srv = TestServer::spawn().await;
    let picker = srv.login("picker", "picker123").await;

    let (status, body) = srv.post(&picker, "/orders/ORD-001/pack", json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = srv.get(&picker, "/users").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn receipt_lifecycle() {
    let srv = TestServer::spawn().await;
    let token = srv.login("supervisor", "super123").await;

    let (status, _) = srv
        .post(&token, "/receipts", json!({ "ref": "RCPT-002", "vendor": "Acme" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = srv.post(&token, "/receipts", json!({ "ref": "RCPT-002" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate_ref");

    let (status, body) = srv.post(&token, "/receipts", json!({ "ref": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = srv
        .post(&token, "/receipts/RCPT-002/lines", json!({ "sku": "SKU-002", "qty": 10 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, receipt) = srv
        .post(&token, "/receipts/RCPT-002/lines/1/receive", json!({ "qty": 10 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["lines"][0]["received_qty"], 10);

    let (status, receipt) = srv.post(&token, "/receipts/RCPT-002/close", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["status"], "received");

    let (_, item) = srv.get(&token, "/items/SKU-002").await;
    assert_eq!(item["on_hand"], 35);

    let (_, list) = srv.get(&token, "/receipts").await;
    assert_eq!(list["items"][0]["receipt_ref"], "RCPT-002");
}

#[tokio::test]
async fn order_pack_ship_close() {
    let srv = TestServer::spawn().await;
    let token = srv.login("supervisor", "super123").await;

    let (status, body) = srv.post(&token, "/orders/ORD-001/pack", json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "incomplete_lines");
    assert_eq!(body["lines"], json!([1, 2]));

    srv.post(&token, "/orders/ORD-001/lines/1/pick", json!({ "qty": 5 })).await;
    srv.post(&token, "/orders/ORD-001/lines/2/pick", json!({ "qty": 2 })).await;

    let (status, order) = srv.post(&token, "/orders/ORD-001/pack", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "packed");

    let (status, order) = srv
        .post(&token, "/orders/ORD-001/ship", json!({ "carrier": "JNE", "tracking_no": "T-1" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "shipped");
    assert_eq!(order["shipments"].as_array().unwrap().len(), 1);

    let (status, order) = srv.post(&token, "/orders/ORD-001/close", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "closed");

    let (status, dashboard) = srv.get(&token, "/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["orders_by_status"]["closed"], 1);
    assert_eq!(dashboard["total_items"], 3);

    let (status, _) = srv.get(&token, "/orders/ORD-404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn item_search_and_admin_edit() {
    let srv = TestServer::spawn().await;
    let admin = srv.login("admin", "admin123").await;

    let (status, list) = srv.get(&admin, "/items?q=tape").await;
    assert_eq!(status, StatusCode::OK);
    let skus: Vec<&str> = list["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["sku"].as_str().unwrap())
        .collect();
    assert_eq!(skus, ["SKU-003"]);

    let res = srv
        .client
        .patch(srv.url("/items/SKU-003"))
        .bearer_auth(&admin)
        .json(&json!({ "bin_location": "C2-07", "reorder_point": 80 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let item: Value = res.json().await.unwrap();
    assert_eq!(item["bin_location"], "C2-07");
    assert_eq!(item["low_stock"], true);

    let (status, created) = srv
        .post(&admin, "/items", json!({ "sku": "SKU-010", "name": "Gloves", "opening_stock": 4 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["on_hand"], 4);
}

#[tokio::test]
async fn user_administration() {
    let srv = TestServer::spawn().await;
    let admin = srv.login("admin", "admin123").await;

    let (_, me) = srv.get(&admin, "/whoami").await;
    let my_id = me["user_id"].as_str().unwrap().to_string();
    let res = srv
        .client
        .delete(srv.url(&format!("/users/{my_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "self_deletion");

    let (status, user) = srv
        .post(&admin, "/users", json!({ "username": "packer", "password": "pw", "role": "picker" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let packer_id = user["user_id"].as_str().unwrap().to_string();

    let res = srv
        .client
        .patch(srv.url(&format!("/users/{packer_id}")))
        .bearer_auth(&admin)
        .json(&json!({ "role": "supervisor" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let (status, _) = srv
        .post(&admin, &format!("/users/{packer_id}/password"), json!({ "password": "pw2" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let packer = srv.login("packer", "pw2").await;
    let (_, me) = srv.get(&packer, "/whoami").await;
    assert_eq!(me["role"], "supervisor");

    let res = srv
        .client
        .post(srv.url("/account/password"))
        .bearer_auth(&packer)
        .json(&json!({ "old_password": "pw2", "new_password": "pw3" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    srv.login("packer", "pw3").await;

    let res = srv
        .client
        .delete(srv.url(&format!("/users/{packer_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = srv
        .client
        .delete(srv.url("/users/not-a-uuid"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tokens_follow_the_user_store() {
    let srv = TestServer::spawn().await;
    let admin = srv.login("admin", "admin123").await;
    let supervisor = srv.login("supervisor", "super123").await;
    let (_, me) = srv.get(&supervisor, "/whoami").await;
    let supervisor_id = me["user_id"].as_str().unwrap().to_string();

    // Demotion applies to a token issued before it.
    let res = srv
        .client
        .patch(srv.url(&format!("/users/{supervisor_id}")))
        .bearer_auth(&admin)
        .json(&json!({ "role": "picker" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let (_, me) = srv.get(&supervisor, "/whoami").await;
    assert_eq!(me["role"], "picker");
    let (status, _) = srv.post(&supervisor, "/orders", json!({ "ref": "ORD-009" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Deletion revokes it.
    let res = srv
        .client
        .delete(srv.url(&format!("/users/{supervisor_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let (status, body) = srv.post(&supervisor, "/orders", json!({ "ref": "ORD-GHOST" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    let (status, _) = srv.get(&supervisor, "/whoami").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A well-signed token for a user that never existed.
    let stranger = mint_jwt(JWT_SECRET, Role::Admin);
    let (status, _) = srv.get(&stranger, "/items").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn oversized_quantities_are_rejected() {
    let srv = TestServer::spawn().await;
    let token = srv.login("admin", "admin123").await;

    let (status, body) = srv
        .post(&token, "/receipts/RCPT-001/lines/1/receive", json!({ "qty": i64::MAX }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invariant_violation");

    let (_, item) = srv.get(&token, "/items/SKU-001").await;
    assert_eq!(item["on_hand"], 100);
}
