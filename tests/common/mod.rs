#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use libris::libris_config::{CorsConfig, JwtConfig, PasswordConfig};
use libris::libris_db::{MemoryRefreshTokenStore, MemoryUserStore, UserStore};
use libris::libris_models::UserRole;
use libris::provisioning::NoopProvisioner;
use libris::router::init_router;
use libris::state::AppState;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-characters-long";
pub const TEST_PASSWORD: &str = "Passw0rd!";

pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemoryUserStore>,
    pub tokens: Arc<MemoryRefreshTokenStore>,
    pub jwt_config: JwtConfig,
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: TEST_SECRET.to_string(),
        access_token_ttl_hours: 1,
        refresh_token_ttl_hours: 168,
    }
}

pub fn setup_test_app() -> TestApp {
    let users = Arc::new(MemoryUserStore::new());
    let tokens = Arc::new(MemoryRefreshTokenStore::new());
    let jwt_config = test_jwt_config();

    let state = AppState::new(
        users.clone(),
        tokens.clone(),
        Arc::new(NoopProvisioner),
        &jwt_config,
        &PasswordConfig { bcrypt_cost: 4 },
        CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
    );

    TestApp {
        router: init_router(state),
        users,
        tokens,
        jwt_config,
    }
}

pub fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn read_json(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Registers through the router and returns the token pair body.
pub async fn register(app: &TestApp, username: &str, email: &str) -> Value {
    let response = app
        .send(json_request(
            "POST",
            "/api/auth/register",
            json!({
                "username": username,
                "email": email,
                "password": TEST_PASSWORD,
            }),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

pub async fn login(app: &TestApp, identifier: &str, password: &str) -> Response<Body> {
    app.send(json_request(
        "POST",
        "/api/auth/login",
        json!({ "username_or_email": identifier, "password": password }),
        None,
    ))
    .await
}

pub async fn refresh(app: &TestApp, refresh_token: &str) -> Response<Body> {
    app.send(json_request(
        "POST",
        "/api/auth/refresh-token",
        json!({ "refresh_token": refresh_token }),
        None,
    ))
    .await
}

/// Registers a user, promotes them to admin and logs in again so the token carries
/// the new role.
pub async fn admin_access_token(app: &TestApp) -> String {
    register(app, "root", "root@libris.local").await;
    app.users.update_role("root", UserRole::Admin).await.unwrap();

    let body = read_json(login(app, "root", TEST_PASSWORD).await).await;
    body["access_token"].as_str().unwrap().to_string()
}
