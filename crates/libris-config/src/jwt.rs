use std::env;

use crate::{ConfigError, parse_or};

/// HMAC keys shorter than this are rejected at startup.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Access token lifetime in hours.
    pub access_token_ttl_hours: i64,
    /// Refresh token lifetime in hours.
    pub refresh_token_ttl_hours: i64,
}

// The secret must never end up in logs.
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_ttl_hours", &self.access_token_ttl_hours)
            .field("refresh_token_ttl_hours", &self.refresh_token_ttl_hours)
            .finish()
    }
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET_KEY")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?;

        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                name: "JWT_SECRET_KEY",
                reason: format!("must be at least {} bytes", MIN_SECRET_LEN),
            });
        }

        let access_token_ttl_hours: i64 = parse_or(&lookup, "JWT_EXP_HOURS", 1)?;
        let refresh_token_ttl_hours: i64 = parse_or(&lookup, "JWT_REFRESH_EXP_HOURS", 168)?;

        if access_token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                name: "JWT_EXP_HOURS",
                reason: "must be positive".to_string(),
            });
        }
        if refresh_token_ttl_hours <= access_token_ttl_hours {
            return Err(ConfigError::Invalid {
                name: "JWT_REFRESH_EXP_HOURS",
                reason: "must be longer than JWT_EXP_HOURS".to_string(),
            });
        }

        Ok(Self {
            secret,
            access_token_ttl_hours,
            refresh_token_ttl_hours,
        })
    }
}
