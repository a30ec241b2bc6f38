//! Black-box API tests
//!
//! Spin up the real router on an ephemeral port and drive the full
//! authentication and authorization surface over HTTP.

use authgate_api::{create_router, state::AppState};
use authgate_core::AppConfig;
use authgate_kv::MemoryStore;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-process token store, ephemeral port
        let state = Arc::new(
            AppState::new(AppConfig::default(), Arc::new(MemoryStore::new()))
                .expect("failed to build state"),
        );
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn register(
    client: &reqwest::Client,
    base_url: &str,
    username: &str,
    email: &str,
    password: &str,
    role: Option<&str>,
) -> reqwest::Response {
    let mut body = json!({
        "username": username,
        "email": email,
        "password": password,
    });
    if let Some(role) = role {
        body["role"] = json!(role);
    }

    client
        .post(format!("{base_url}/api/v1/auth/register"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn login(
    client: &reqwest::Client,
    base_url: &str,
    username: &str,
    password: &str,
) -> reqwest::Response {
    client
        .post(format!("{base_url}/api/v1/auth/login"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn register_login_refresh_logout_flow() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Register
    let res = register(
        &client,
        &srv.base_url,
        "alice",
        "a@x.com",
        "Str0ng!Pass",
        Some("USER"),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let user: Value = res.json().await.unwrap();
    let user_id = user["id"].as_str().unwrap().to_string();
    assert_eq!(user["username"], "alice");
    assert_eq!(user["role"], "USER");
    assert!(user.get("password_hash").is_none());

    // Login
    let res = login(&client, &srv.base_url, "alice", "Str0ng!Pass").await;
    assert_eq!(res.status(), StatusCode::OK);
    let tokens: Value = res.json().await.unwrap();
    let access_token = tokens["access_token"].as_str().unwrap().to_string();
    let refresh_token = tokens["refresh_token"].as_str().unwrap().to_string();
    assert_eq!(tokens["token_type"], "bearer");
    assert_eq!(tokens["user"]["id"].as_str().unwrap(), user_id);

    // The access token resolves the principal
    let res = client
        .get(format!("{}/api/v1/auth/me", srv.base_url))
        .bearer_auth(&access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let me: Value = res.json().await.unwrap();
    assert_eq!(me["id"].as_str().unwrap(), user_id);
    assert!(me["last_login"].as_str().is_some());

    // Refresh mints a new access token; the refresh token is not rotated
    let res = client
        .post(format!("{}/api/v1/auth/refresh", srv.base_url))
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let refreshed: Value = res.json().await.unwrap();
    assert_eq!(refreshed["refresh_token"].as_str().unwrap(), refresh_token);

    // The same refresh token keeps working until logout
    let res = client
        .post(format!("{}/api/v1/auth/refresh", srv.base_url))
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Logout deletes the stored slot
    let res = client
        .post(format!("{}/api/v1/auth/logout", srv.base_url))
        .bearer_auth(&access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(format!("{}/api/v1/auth/refresh", srv.base_url))
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_REFRESH_TOKEN");
}

#[tokio::test]
async fn weak_password_is_rejected_without_creating_a_user() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = register(&client, &srv.base_url, "bob", "b@x.com", "abc", None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "WEAK_PASSWORD");

    // No account exists for the rejected registration
    let res = login(&client, &srv.base_url, "bob", "abc").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn duplicate_username_and_email_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = register(&client, &srv.base_url, "carol", "c@x.com", "Str0ng!Pass", None).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = register(
        &client,
        &srv.base_url,
        "carol",
        "other@x.com",
        "Str0ng!Pass",
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "DUPLICATE_USERNAME");

    let res = register(
        &client,
        &srv.base_url,
        "carola",
        "c@x.com",
        "Str0ng!Pass",
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "DUPLICATE_EMAIL");
}

#[tokio::test]
async fn login_failures_are_opaque() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    register(&client, &srv.base_url, "dave", "d@x.com", "Str0ng!Pass", None).await;

    // Unknown username and wrong password return identical failures
    let unknown = login(&client, &srv.base_url, "nobody", "Str0ng!Pass").await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let unknown_body: Value = unknown.json().await.unwrap();

    let mismatch = login(&client, &srv.base_url, "dave", "Wrong!Pass1").await;
    assert_eq!(mismatch.status(), StatusCode::UNAUTHORIZED);
    let mismatch_body: Value = mismatch.json().await.unwrap();

    assert_eq!(unknown_body, mismatch_body);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/v1/auth/me", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "MISSING_TOKEN");

    let res = client
        .get(format!("{}/api/v1/auth/me", srv.base_url))
        .bearer_auth("not.a.token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "MALFORMED_TOKEN");
}

async fn access_token_for(
    client: &reqwest::Client,
    base_url: &str,
    username: &str,
    email: &str,
    role: &str,
) -> (String, String) {
    let res = register(client, base_url, username, email, "Str0ng!Pass", Some(role)).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let user: Value = res.json().await.unwrap();

    let res = login(client, base_url, username, "Str0ng!Pass").await;
    assert_eq!(res.status(), StatusCode::OK);
    let tokens: Value = res.json().await.unwrap();

    (
        tokens["access_token"].as_str().unwrap().to_string(),
        user["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn editor_permissions_are_monotonic() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (editor_token, editor_id) =
        access_token_for(&client, &srv.base_url, "edna", "e@x.com", "EDITOR").await;

    // READ_ITEMS
    let res = client
        .get(format!("{}/api/v1/items", srv.base_url))
        .bearer_auth(&editor_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // WRITE_ITEMS, owner recorded from the principal
    let res = client
        .post(format!("{}/api/v1/items", srv.base_url))
        .bearer_auth(&editor_token)
        .json(&json!({ "name": "widget" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let item: Value = res.json().await.unwrap();
    assert_eq!(item["owner_id"].as_str().unwrap(), editor_id);
    let item_id = item["id"].as_str().unwrap().to_string();

    // DELETE_ITEMS is not granted to editors
    let res = client
        .delete(format!("{}/api/v1/items/{item_id}", srv.base_url))
        .bearer_auth(&editor_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "INSUFFICIENT_PERMISSIONS");
    assert_eq!(body["details"]["missing"], json!(["DELETE_ITEMS"]));

    // Plain users cannot write
    let (user_token, _) =
        access_token_for(&client, &srv.base_url, "uma", "u@x.com", "USER").await;
    let res = client
        .post(format!("{}/api/v1/items", srv.base_url))
        .bearer_auth(&user_token)
        .json(&json!({ "name": "gadget" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_holds_every_permission_and_role_guard() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (admin_token, _) =
        access_token_for(&client, &srv.base_url, "root", "r@x.com", "ADMIN").await;
    let (editor_token, _) =
        access_token_for(&client, &srv.base_url, "edna", "e@x.com", "EDITOR").await;

    // Create as editor, update and delete as admin
    let res = client
        .post(format!("{}/api/v1/items", srv.base_url))
        .bearer_auth(&editor_token)
        .json(&json!({ "name": "widget" }))
        .send()
        .await
        .unwrap();
    let item: Value = res.json().await.unwrap();
    let item_id = item["id"].as_str().unwrap().to_string();

    let res = client
        .put(format!("{}/api/v1/items/{item_id}", srv.base_url))
        .bearer_auth(&admin_token)
        .json(&json!({ "name": "renamed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Editors fail the admin role guard
    let res = client
        .put(format!("{}/api/v1/items/{item_id}", srv.base_url))
        .bearer_auth(&editor_token)
        .json(&json!({ "name": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // DELETE_ITEMS flows from the implicit admin grant
    let res = client
        .delete(format!("{}/api/v1/items/{item_id}", srv.base_url))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Admin-only listing
    let res = client
        .get(format!("{}/api/v1/admin/users", srv.base_url))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let users: Value = res.json().await.unwrap();
    assert_eq!(users.as_array().unwrap().len(), 2);

    let res = client
        .get(format!("{}/api/v1/admin/users", srv.base_url))
        .bearer_auth(&editor_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn ownership_check_with_admin_bypass() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (alice_token, alice_id) =
        access_token_for(&client, &srv.base_url, "alice", "a@x.com", "USER").await;
    let (bob_token, bob_id) =
        access_token_for(&client, &srv.base_url, "bob", "b@x.com", "USER").await;
    let (admin_token, _) =
        access_token_for(&client, &srv.base_url, "root", "r@x.com", "ADMIN").await;

    // Owners see their own record
    let res = client
        .get(format!("{}/api/v1/users/{alice_id}", srv.base_url))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Mismatched ids are rejected
    let res = client
        .get(format!("{}/api/v1/users/{alice_id}", srv.base_url))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "NOT_RESOURCE_OWNER");

    // Admin bypasses the ownership check unconditionally
    let res = client
        .get(format!("{}/api/v1/users/{bob_id}", srv.base_url))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_and_readiness() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    // Security headers ride on every response
    assert_eq!(res.headers().get("x-frame-options").unwrap(), "DENY");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let res = client
        .get(format!("{}/ready", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["checks"]["key_value_store"], true);
}
