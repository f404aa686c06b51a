mod common;

use axum::http::StatusCode;
use serde_json::json;

use libris::libris_auth::verify_token;
use common::{
    TEST_PASSWORD, get_request, json_request, login, read_json, refresh, register, setup_test_app,
};

#[tokio::test]
async fn test_register_returns_token_pair() {
    let app = setup_test_app();
    let body = register(&app, "alice", "alice@x.com").await;

    let access_token = body["access_token"].as_str().unwrap();
    let refresh_token = body["refresh_token"].as_str().unwrap();
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);

    let claims = verify_token(access_token, &app.jwt_config).unwrap();
    assert_eq!(claims.username, "alice");
    assert_eq!(claims.role, "user");

    // Opaque, not a JWT
    assert_eq!(refresh_token.len(), 43);
    assert!(!refresh_token.contains('.'));
}

#[tokio::test]
async fn test_register_validation_error() {
    let app = setup_test_app();

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/register",
            json!({ "username": "al@ce", "email": "not-an-email", "password": "short" }),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = read_json(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("email"));
    assert!(error.contains("password"));
    assert!(error.contains("username"));
}

#[tokio::test]
async fn test_register_missing_field() {
    let app = setup_test_app();

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/register",
            json!({ "username": "alice", "email": "alice@x.com" }),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "password: is required");
}

#[tokio::test]
async fn test_register_duplicate_is_conflict() {
    let app = setup_test_app();
    register(&app, "alice", "alice@x.com").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/register",
            json!({ "username": "alice2", "email": "alice@x.com", "password": TEST_PASSWORD }),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(read_json(response).await["error"], "Email already registered");
}

#[tokio::test]
async fn test_login_success_by_email() {
    let app = setup_test_app();
    register(&app, "alice", "alice@x.com").await;

    let response = login(&app, "alice@x.com", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = setup_test_app();
    register(&app, "alice", "alice@x.com").await;

    let wrong_password = login(&app, "alice", "Wr0ngPassword").await;
    let unknown_user = login(&app, "nobody", TEST_PASSWORD).await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        read_json(wrong_password).await,
        read_json(unknown_user).await
    );
}

#[tokio::test]
async fn test_login_empty_fields() {
    let app = setup_test_app();
    let response = login(&app, "", "").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_refresh_token_rotation_over_http() {
    let app = setup_test_app();
    let first = register(&app, "alice", "alice@x.com").await;
    let refresh_a = first["refresh_token"].as_str().unwrap();

    let response = refresh(&app, refresh_a).await;
    assert_eq!(response.status(), StatusCode::OK);
    let second = read_json(response).await;
    let refresh_b = second["refresh_token"].as_str().unwrap();
    assert_ne!(refresh_a, refresh_b);

    let replay = refresh(&app, refresh_a).await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(replay).await["error"], "Invalid Refresh Token");

    let third = read_json(login(&app, "alice", TEST_PASSWORD).await).await;
    let superseded = refresh(&app, refresh_b).await;
    assert_eq!(superseded.status(), StatusCode::UNAUTHORIZED);

    let refresh_c = third["refresh_token"].as_str().unwrap();
    assert_eq!(refresh(&app, refresh_c).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_with_access_token_is_rejected() {
    let app = setup_test_app();
    let pair = register(&app, "alice", "alice@x.com").await;

    let response = refresh(&app, pair["access_token"].as_str().unwrap()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let app = setup_test_app();
    let pair = register(&app, "alice", "alice@x.com").await;
    let access_token = pair["access_token"].as_str().unwrap();

    let response = app
        .send(json_request("POST", "/api/auth/logout", json!({}), Some(access_token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["message"], "Logged out");

    let response = refresh(&app, pair["refresh_token"].as_str().unwrap()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The access token stays valid until it expires.
    let response = app.send(get_request("/api/users/me", Some(access_token))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_requires_token() {
    let app = setup_test_app();
    let response = app
        .send(json_request("POST", "/api/auth/logout", json!({}), None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
