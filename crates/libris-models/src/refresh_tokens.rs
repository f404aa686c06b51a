//! Persisted refresh tokens.
//!
//! A row is redeemable iff `invalid = false AND used_at IS NULL AND now < expires_at`.
//! Per owner, at most one row is ever live (`invalid = false AND used_at IS NULL`).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    /// SHA-256 of the bearer value. The value itself is never stored.
    pub token_hash: String,
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub invalid: bool,
}

impl RefreshToken {
    #[inline]
    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    #[inline]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Not yet redeemed and not superseded.
    #[inline]
    pub fn is_live(&self) -> bool {
        !self.invalid && !self.is_used()
    }

    #[inline]
    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_live() && !self.is_expired_at(now)
    }
}

#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub token_hash: String,
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
