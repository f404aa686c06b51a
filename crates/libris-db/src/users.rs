//! Credential store.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use libris_models::{NewUser, User, UserRole, UserUpdate};

use crate::StoreError;

const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at, updated_at";

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user. A duplicate username or email is [`StoreError::Conflict`].
    async fn create(&self, user: &NewUser) -> Result<User, StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Applies the fields set in `update`. [`StoreError::NotFound`] when `id` is unknown,
    /// [`StoreError::Conflict`] when the new username or email belongs to another user.
    async fn update(&self, id: Uuid, update: &UserUpdate) -> Result<User, StoreError>;

    /// Returns [`StoreError::NotFound`] when no user has `username`.
    async fn update_role(&self, username: &str, role: UserRole) -> Result<User, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn create(&self, user: &NewUser) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users (username, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, update))]
    async fn update(&self, id: Uuid, update: &UserUpdate) -> Result<User, StoreError> {
        let query = format!(
            "UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                role = COALESCE($5, role),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(update.username.as_deref())
            .bind(update.email.as_deref())
            .bind(update.password_hash.as_deref())
            .bind(update.role)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    #[instrument(skip(self))]
    async fn update_role(&self, username: &str, role: UserRole) -> Result<User, StoreError> {
        let query = format!(
            "UPDATE users SET role = $1, updated_at = NOW()
             WHERE username = $2
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(role)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }
}
