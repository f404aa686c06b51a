//! # Libris Config
//!
//! Configuration structures loaded once from the environment at process start and
//! treated as immutable afterwards:
//!
//! - [`jwt`]: signing secret and token lifetimes
//! - [`database`]: PostgreSQL connection parameters
//! - [`server`]: listen address
//! - [`password`]: bcrypt cost
//! - [`cors`]: allowed browser origins
//! - [`provisioning`]: downstream author service used for best-effort profile creation
//! - [`seed`]: initial accounts created by `libris-cli seed`
//!
//! Every struct exposes `from_env()` and a `from_vars` constructor taking a lookup
//! function, so tests can supply variables without touching the process environment.
//!
//! # Example
//!
//! ```ignore
//! use libris_config::{DatabaseConfig, JwtConfig};
//!
//! dotenvy::dotenv().ok();
//! let jwt_config = JwtConfig::from_env()?;
//! let database = DatabaseConfig::from_env()?;
//! ```

pub mod cors;
pub mod database;
pub mod jwt;
pub mod password;
pub mod provisioning;
pub mod seed;
pub mod server;

pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use jwt::JwtConfig;
pub use password::PasswordConfig;
pub use provisioning::ProvisioningConfig;
pub use seed::{SeedAccount, SeedConfig};
pub use server::ServerConfig;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Reads and parses an optional variable, falling back to `default` when unset.
pub(crate) fn parse_or<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: std::collections::HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}
