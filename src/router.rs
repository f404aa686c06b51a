use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use axum::{Json, Router, middleware};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::logging::logging_middleware;
use crate::metrics::{metrics_handler, metrics_middleware};
use crate::modules::auth::router::init_auth_router;
use crate::modules::users::router::init_users_router;
use crate::state::AppState;

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .nest(
            "/api",
            Router::new()
                .nest("/auth", init_auth_router())
                .nest("/users", init_users_router(state.clone())),
        )
        .with_state(state.clone())
        .layer(cors_layer(&state))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}
