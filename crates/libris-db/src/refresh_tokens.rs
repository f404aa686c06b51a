//! Refresh token store.
//!
//! Rows are keyed by the SHA-256 of the bearer value; lookups hash the presented value
//! first. [`RefreshTokenStore::rotate`] is the only write path used when issuing a
//! session, and it keeps at most one live row per owner.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use libris_auth::hash_refresh_token;
use libris_models::{NewRefreshToken, RefreshToken};

use crate::StoreError;

const TOKEN_COLUMNS: &str = "id, token_hash, user_id, issued_at, expires_at, used_at, invalid";

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn create(&self, token: &NewRefreshToken) -> Result<RefreshToken, StoreError>;

    /// Looks a row up by the bearer value. Does not modify it.
    async fn get_by_token(&self, value: &str) -> Result<RefreshToken, StoreError>;

    /// Marks every live token of `user_id` invalid and returns how many changed.
    async fn invalidate_many_by_owner(&self, user_id: Uuid) -> Result<u64, StoreError>;

    /// Atomically replaces the live token of `user_id` with `replacement`.
    ///
    /// When `redeemed` is given, that token must still be redeemable and owned by
    /// `user_id`; it is marked used in the same transaction. If another caller got there
    /// first nothing is written and [`StoreError::Stale`] is returned.
    async fn rotate(
        &self,
        user_id: Uuid,
        redeemed: Option<&str>,
        replacement: &NewRefreshToken,
    ) -> Result<RefreshToken, StoreError>;
}

#[derive(Clone)]
pub struct PgRefreshTokenStore {
    pool: PgPool,
}

impl PgRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    #[instrument(skip(self, token), fields(user_id = %token.user_id))]
    async fn create(&self, token: &NewRefreshToken) -> Result<RefreshToken, StoreError> {
        let query = format!(
            "INSERT INTO refresh_tokens (token_hash, user_id, issued_at, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            TOKEN_COLUMNS
        );

        let row = sqlx::query_as::<_, RefreshToken>(&query)
            .bind(&token.token_hash)
            .bind(token.user_id)
            .bind(token.issued_at)
            .bind(token.expires_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    #[instrument(skip_all)]
    async fn get_by_token(&self, value: &str) -> Result<RefreshToken, StoreError> {
        let query = format!(
            "SELECT {} FROM refresh_tokens WHERE token_hash = $1",
            TOKEN_COLUMNS
        );

        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(hash_refresh_token(value))
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    #[instrument(skip(self))]
    async fn invalidate_many_by_owner(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET invalid = TRUE
             WHERE user_id = $1 AND invalid = FALSE AND used_at IS NULL",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self, redeemed, replacement), fields(redeeming = redeemed.is_some()))]
    async fn rotate(
        &self,
        user_id: Uuid,
        redeemed: Option<&str>,
        replacement: &NewRefreshToken,
    ) -> Result<RefreshToken, StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Serializes rotations for one owner so concurrent logins cannot both insert.
        let owner: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
        if owner.is_none() {
            tx.rollback().await?;
            return Err(StoreError::NotFound);
        }

        if let Some(value) = redeemed {
            let result = sqlx::query(
                "UPDATE refresh_tokens SET used_at = $1, invalid = TRUE
                 WHERE token_hash = $2 AND user_id = $3
                   AND used_at IS NULL AND invalid = FALSE AND expires_at > $1",
            )
            .bind(now)
            .bind(hash_refresh_token(value))
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() != 1 {
                tx.rollback().await?;
                debug!("Redeemed refresh token no longer live");
                return Err(StoreError::Stale);
            }
        }

        let invalidated = sqlx::query(
            "UPDATE refresh_tokens SET invalid = TRUE
             WHERE user_id = $1 AND invalid = FALSE AND used_at IS NULL",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let query = format!(
            "INSERT INTO refresh_tokens (token_hash, user_id, issued_at, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            TOKEN_COLUMNS
        );
        let row = sqlx::query_as::<_, RefreshToken>(&query)
            .bind(&replacement.token_hash)
            .bind(replacement.user_id)
            .bind(replacement.issued_at)
            .bind(replacement.expires_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(invalidated, "Refresh token rotated");
        Ok(row)
    }
}
