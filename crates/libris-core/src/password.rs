//! Password hashing backed by bcrypt.
//!
//! bcrypt salts every hash and its `verify` compares digests in constant time.
//! Plaintext passwords are never logged by anything in this module.

use bcrypt::{DEFAULT_COST, hash, verify};

use crate::errors::AppError;

pub const DEFAULT_BCRYPT_COST: u32 = DEFAULT_COST;

/// Hashes a password with [`DEFAULT_COST`].
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash_password_with_cost(password, DEFAULT_COST)
}

/// Hashes a password with an explicit bcrypt cost (4..=31).
///
/// An out-of-range cost is a deployment misconfiguration and surfaces as an
/// internal error.
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))
}

/// Returns `Ok(false)` on mismatch. A malformed stored hash is an internal error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal(format!("Failed to verify password: {}", e)))
}
