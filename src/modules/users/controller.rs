use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::instrument;
use uuid::Uuid;

use libris_core::AppError;
use libris_models::{CreateUserRequest, UpdateUserRequest, UserProfile};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[instrument(skip(state, auth_user), fields(user_id = %auth_user.0.sub))]
pub async fn get_current_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    let profile = state.users.get_profile(auth_user.user_id()?).await?;
    Ok(Json(profile))
}

/// Admin only, like the handlers below; the router layers `require_admin` over them.
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = state.users.get_profile(id).await?;
    Ok(Json(profile))
}

#[instrument(skip(state))]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let profile = state.users.create_user(dto).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

#[instrument(skip(state))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = state.users.update_user(id, dto).await?;
    Ok(Json(profile))
}
