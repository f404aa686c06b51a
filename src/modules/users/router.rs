use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::auth::require_auth;
use crate::middleware::role::require_admin;
use crate::state::AppState;

use super::controller::{create_user, get_current_user, get_user, update_user};

pub fn init_users_router(state: AppState) -> Router<AppState> {
    let admin_routes = Router::new()
        .route("/", post(create_user))
        .route("/{id}", get(get_user).patch(update_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/me", get(get_current_user))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
