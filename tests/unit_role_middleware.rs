mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Router, middleware};
use uuid::Uuid;

use libris::libris_auth::{Subject, TokenSigner};
use libris::libris_config::{CorsConfig, PasswordConfig};
use libris::libris_db::{MemoryRefreshTokenStore, MemoryUserStore};
use libris::middleware::auth::{AuthUser, require_auth};
use libris::middleware::role::{RequireAdmin, require_admin};
use libris::provisioning::NoopProvisioner;
use libris::state::AppState;
use tower::ServiceExt;

use common::{get_request, test_jwt_config};

fn state() -> AppState {
    AppState::new(
        Arc::new(MemoryUserStore::new()),
        Arc::new(MemoryRefreshTokenStore::new()),
        Arc::new(NoopProvisioner),
        &test_jwt_config(),
        &PasswordConfig { bcrypt_cost: 4 },
        CorsConfig {
            allowed_origins: vec![],
        },
    )
}

fn token_with_role(role: &str) -> String {
    TokenSigner::new(&test_jwt_config())
        .issue(&Subject {
            user_id: Uuid::new_v4(),
            username: "tester",
            email: "tester@x.com",
            role,
        })
        .unwrap()
}

async fn whoami(AuthUser(claims): AuthUser) -> String {
    claims.username
}

async fn admin_only(RequireAdmin(user): RequireAdmin) -> String {
    user.0.role
}

fn layered_app(state: AppState) -> Router {
    Router::new()
        .route("/admin", get(whoami))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}

fn extractor_app(state: AppState) -> Router {
    Router::new()
        .route("/admin", get(admin_only))
        .with_state(state)
}

#[tokio::test]
async fn test_require_admin_layer() {
    let cases = [
        (Some(token_with_role("admin")), StatusCode::OK),
        (Some(token_with_role("user")), StatusCode::FORBIDDEN),
        (None, StatusCode::UNAUTHORIZED),
    ];

    for (token, expected) in cases {
        let response = layered_app(state())
            .oneshot(get_request("/admin", token.as_deref()))
            .await
            .unwrap();
        assert_eq!(response.status(), expected);
    }
}

#[tokio::test]
async fn test_require_admin_extractor() {
    let cases = [
        (Some(token_with_role("admin")), StatusCode::OK),
        (Some(token_with_role("user")), StatusCode::FORBIDDEN),
        (Some("garbage".to_string()), StatusCode::UNAUTHORIZED),
        (None, StatusCode::UNAUTHORIZED),
    ];

    for (token, expected) in cases {
        let response = extractor_app(state())
            .oneshot(get_request("/admin", token.as_deref()))
            .await
            .unwrap();
        assert_eq!(response.status(), expected);
    }
}

#[tokio::test]
async fn test_role_claim_is_case_sensitive() {
    let response = extractor_app(state())
        .oneshot(get_request("/admin", Some(&token_with_role("Admin"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
