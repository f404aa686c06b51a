//! Session endpoint DTOs.
//!
//! Request types derive [`Validate`]; the HTTP layer rejects invalid bodies with a
//! 400 before the session engine runs. Password fields are redacted from `Debug` so
//! `#[instrument]`ed handlers never log plaintext.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Registration request.
#[derive(Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 3, max = 32, message = "must be between 3 and 32 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(
        email(message = "must be a valid email address"),
        length(max = 254, message = "must be at most 254 characters")
    )]
    pub email: String,
    #[validate(
        length(min = 8, max = 72, message = "must be between 8 and 72 characters"),
        custom(function = "validate_password_strength")
    )]
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login request. `username_or_email` is treated as an email when it contains `@`.
#[derive(Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254, message = "is required"))]
    pub username_or_email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username_or_email", &self.username_or_email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How a login identifier is resolved.
///
/// The split on `@` is a heuristic, not a format check. It is unambiguous for accounts
/// created here because usernames may not contain `@`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginIdentifier<'a> {
    Email(&'a str),
    Username(&'a str),
}

impl LoginRequest {
    pub fn identifier(&self) -> LoginIdentifier<'_> {
        let value = self.username_or_email.trim();
        if value.contains('@') {
            LoginIdentifier::Email(value)
        } else {
            LoginIdentifier::Username(value)
        }
    }
}

#[derive(Clone, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, max = 512, message = "is required"))]
    pub refresh_token: String,
}

impl fmt::Debug for RefreshTokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshTokenRequest")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Returned by register, login and refresh.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

impl TokenPairResponse {
    pub fn bearer(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

impl fmt::Debug for TokenPairResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPairResponse")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

pub(crate) fn validate_username(username: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-');
    if username.chars().all(allowed) {
        return Ok(());
    }

    let mut error = ValidationError::new("username_charset");
    error.message = Some("may only contain letters, digits, '_', '.' and '-'".into());
    Err(error)
}

pub(crate) fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    // bcrypt ignores everything past 72 bytes
    if password.len() > 72 {
        let mut error = ValidationError::new("password_bytes");
        error.message = Some("must be at most 72 bytes".into());
        return Err(error);
    }

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if has_lower && has_upper && has_digit {
        return Ok(());
    }

    let mut error = ValidationError::new("password_strength");
    error.message =
        Some("must contain at least one lowercase letter, one uppercase letter and one digit".into());
    Err(error)
}
