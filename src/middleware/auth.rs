//! Access token verification for protected routes.
//!
//! Verification is local: the bearer token is checked against the shared signing
//! secret and the clock, with no storage access.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

use libris_auth::Claims;
use libris_core::AppError;

use crate::state::AppState;

/// Extractor that provides the authenticated caller's claims.
///
/// Reuses the claims stored by [`require_auth`] when the route is layered, otherwise
/// verifies the `Authorization` header itself.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> Result<uuid::Uuid, AppError> {
        self.0.user_id()
    }

    pub fn is_admin(&self) -> bool {
        self.0.has_role("admin")
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>() {
            return Ok(AuthUser(claims.clone()));
        }

        let token = bearer_token(&parts.headers)?;
        let claims = state.signer.verify(token)?;
        Ok(AuthUser(claims))
    }
}

/// Rejects the request with 401 unless it carries a valid access token, and makes the
/// verified [`Claims`] available as a request extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())?;
    let claims = state.signer.verify(token)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AppError::unauthorized("Invalid authorization header format")),
    }
}
