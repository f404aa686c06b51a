use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::instrument;

use libris_core::AppError;
use libris_models::{
    LoginRequest, MessageResponse, RefreshTokenRequest, RegisterRequest, TokenPairResponse,
};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[instrument(skip(state))]
pub async fn register_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenPairResponse>), AppError> {
    let pair = state.session.register(dto).await?;
    Ok((StatusCode::CREATED, Json(pair)))
}

#[instrument(skip(state))]
pub async fn login_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenPairResponse>, AppError> {
    let pair = state.session.login(dto).await?;
    Ok(Json(pair))
}

#[instrument(skip(state))]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<TokenPairResponse>, AppError> {
    let pair = state.session.refresh(dto).await?;
    Ok(Json(pair))
}

#[instrument(skip(state, auth_user), fields(user_id = %auth_user.0.sub))]
pub async fn logout_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    state.session.logout(auth_user.user_id()?).await?;
    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}
