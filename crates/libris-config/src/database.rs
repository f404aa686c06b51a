//! PostgreSQL connection parameters.
//!
//! `DATABASE_URL` wins when set. Otherwise the URL is assembled from the discrete
//! `POSTGRESQL_*` variables used by the other Libris services.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: full connection string
//! - `POSTGRESQL_HOST` (default `localhost`), `POSTGRESQL_PORT` (default `5432`)
//! - `POSTGRESQL_USER`, `POSTGRESQL_PASSWORD`, `POSTGRESQL_DB`
//! - `DATABASE_MAX_CONNECTIONS` (default `10`)

use std::env;

use crate::{ConfigError, parse_or};

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_connections: u32 = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;

        if let Some(url) = lookup("DATABASE_URL").filter(|s| !s.is_empty()) {
            return Ok(Self {
                url,
                max_connections,
            });
        }

        let host = lookup("POSTGRESQL_HOST").unwrap_or_else(|| "localhost".to_string());
        let port: u16 = parse_or(&lookup, "POSTGRESQL_PORT", 5432)?;
        let user = lookup("POSTGRESQL_USER").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let password = lookup("POSTGRESQL_PASSWORD").unwrap_or_default();
        let database = lookup("POSTGRESQL_DB").ok_or(ConfigError::Missing("POSTGRESQL_DB"))?;

        let url = if password.is_empty() {
            format!("postgres://{}@{}:{}/{}", user, host, port, database)
        } else {
            format!("postgres://{}:{}@{}:{}/{}", user, password, host, port, database)
        };

        Ok(Self {
            url,
            max_connections,
        })
    }
}
