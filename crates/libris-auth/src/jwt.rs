//! Access token signing and verification.
//!
//! Tokens are compact JWS values signed with HMAC-SHA256 over a single deployment-wide
//! secret. [`TokenSigner`] is built from an injected [`JwtConfig`]; there is no global
//! key state, so tests and services can each hold their own secret.
//!
//! Verification is a pure function of `(token, secret, now)`:
//!
//! - the header algorithm must be exactly HS256 (HS384, HS512, RS256, `none`, ... are
//!   rejected before the signature is checked)
//! - the signature must match
//! - `now` must be strictly before `exp` (no leeway)
//!
//! Every failure maps to the same authentication error so callers cannot tell a bad
//! signature from an expired token.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use libris_config::JwtConfig;
use libris_core::AppError;

use crate::claims::{Claims, Subject};

const ALGORITHM: Algorithm = Algorithm::HS256;
const INVALID_TOKEN: &str = "Invalid or expired token";

#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_ttl_secs: i64,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("algorithm", &ALGORITHM)
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked against an explicit clock in `verify_at`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            access_token_ttl_secs: config.access_token_ttl_hours * 3600,
        }
    }

    pub fn access_token_ttl_secs(&self) -> i64 {
        self.access_token_ttl_secs
    }

    /// Signs an access token for `subject`, valid for the configured TTL from now.
    pub fn issue(&self, subject: &Subject<'_>) -> Result<String, AppError> {
        self.issue_at(subject, Utc::now().timestamp())
    }

    /// Signs an access token as if the current time were `now` (Unix seconds).
    pub fn issue_at(&self, subject: &Subject<'_>, now: i64) -> Result<String, AppError> {
        let claims = Claims {
            sub: subject.user_id.to_string(),
            username: subject.username.to_string(),
            email: subject.email.to_string(),
            role: subject.role.to_string(),
            iat: now,
            exp: now + self.access_token_ttl_secs,
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to create token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verifies `token` against the clock value `now` (Unix seconds).
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::unauthorized(INVALID_TOKEN).with_detail(e.to_string()))?;

        if now >= claims.exp {
            return Err(AppError::unauthorized(INVALID_TOKEN).with_detail("token expired"));
        }

        Ok(claims)
    }
}

/// Verification entry point for services that only hold the shared configuration.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    TokenSigner::new(jwt_config).verify(token)
}
