//! JWT claim structures for access tokens.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use libris_core::AppError;

/// Claims embedded in every access token.
///
/// Everything a downstream service needs for authentication and authorization
/// decisions is here, so verification never needs a database lookup.
///
/// # Fields
///
/// - `sub`: user ID (subject)
/// - `username`, `email`: identity at issuance time
/// - `role`: `user` or `admin`
/// - `iat`, `exp`: issued-at and expiry as Unix timestamps (seconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    pub username: String,
    pub email: String,
    pub role: String,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: i64,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::unauthorized("Invalid or expired token"))
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}

/// The identity an access token is issued for.
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    pub user_id: Uuid,
    pub username: &'a str,
    pub email: &'a str,
    pub role: &'a str,
}
