use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use libris_core::{AppError, DEFAULT_BCRYPT_COST, hash_password_with_cost};
use libris_db::{StoreError, UserStore};
use libris_models::{CreateUserRequest, NewUser, UpdateUserRequest, UserProfile, UserUpdate};

pub(crate) const EMAIL_TAKEN: &str = "Email already registered";
pub(crate) const USERNAME_TAKEN: &str = "Username already taken";

/// Maps a unique-constraint violation from the store to the matching conflict message.
pub(crate) fn identity_conflict(e: StoreError) -> AppError {
    match e {
        StoreError::Conflict(constraint) if constraint.contains("email") => {
            AppError::conflict(EMAIL_TAKEN)
        }
        StoreError::Conflict(_) => AppError::conflict(USERNAME_TAKEN),
        other => other.into(),
    }
}

/// Profile reads and admin account management.
pub struct UserService {
    users: Arc<dyn UserStore>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self {
            users,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, id: Uuid) -> Result<UserProfile, AppError> {
        self.users
            .get_by_id(id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    #[instrument(skip(self, request), fields(username = %request.username, role = %request.role))]
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserProfile, AppError> {
        request.validate()?;

        let username = request.username.trim().to_string();
        let email = request.email.trim().to_lowercase();

        if self.users.get_by_email(&email).await?.is_some() {
            return Err(AppError::conflict(EMAIL_TAKEN));
        }
        if self.users.get_by_username(&username).await?.is_some() {
            return Err(AppError::conflict(USERNAME_TAKEN));
        }

        let password_hash = hash_password_with_cost(&request.password, self.bcrypt_cost)?;
        let user = self
            .users
            .create(&NewUser {
                username,
                email,
                password_hash,
                role: request.role,
            })
            .await
            .map_err(identity_conflict)?;

        info!(user_id = %user.id, "User created by admin");
        Ok(user.into())
    }

    /// Changes only the fields present in `request`. An empty update is rejected.
    #[instrument(skip(self, request))]
    pub async fn update_user(
        &self,
        id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<UserProfile, AppError> {
        request.validate()?;

        let password_hash = match &request.password {
            Some(password) => Some(hash_password_with_cost(password, self.bcrypt_cost)?),
            None => None,
        };
        let update = UserUpdate {
            username: request.username.map(|u| u.trim().to_string()),
            email: request.email.map(|e| e.trim().to_lowercase()),
            password_hash,
            role: request.role,
        };
        if update.is_empty() {
            return Err(AppError::validation("at least one field is required"));
        }

        let existing = self
            .users
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if let Some(email) = &update.email {
            if let Some(owner) = self.users.get_by_email(email).await? {
                if owner.id != existing.id {
                    return Err(AppError::conflict(EMAIL_TAKEN));
                }
            }
        }
        if let Some(username) = &update.username {
            if let Some(owner) = self.users.get_by_username(username).await? {
                if owner.id != existing.id {
                    return Err(AppError::conflict(USERNAME_TAKEN));
                }
            }
        }

        let user = self.users.update(id, &update).await.map_err(|e| match e {
            StoreError::NotFound => AppError::not_found("User not found"),
            other => identity_conflict(other),
        })?;

        info!(user_id = %user.id, "User updated by admin");
        Ok(user.into())
    }
}
