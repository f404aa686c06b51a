//! Role-based authorization.
//!
//! Two forms, like [`crate::middleware::auth`]: a layer for whole routers and an
//! extractor for single handlers. Both read the `role` claim only.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use libris_core::AppError;
use libris_models::UserRole;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

const ADMIN_ONLY: &str = "Access denied. Administrator privileges required.";

pub async fn require_roles(
    state: &AppState,
    req: Request,
    next: Next,
    allowed_roles: &[UserRole],
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();
    let auth_user = AuthUser::from_request_parts(&mut parts, state).await?;

    let allowed = allowed_roles
        .iter()
        .any(|role| auth_user.0.has_role(role.as_str()));
    if !allowed {
        return Err(AppError::forbidden(ADMIN_ONLY)
            .with_detail(format!("role {} not in {:?}", auth_user.0.role, allowed_roles)));
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Layer for admin-only routers:
///
/// ```rust,ignore
/// Router::new()
///     .route("/{id}", get(get_user))
///     .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));
/// ```
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_roles(&state, req, next, &[UserRole::Admin]).await
}

/// Extractor for admin-only handlers.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        if !auth_user.is_admin() {
            return Err(AppError::forbidden(ADMIN_ONLY));
        }

        Ok(RequireAdmin(auth_user))
    }
}
