//! Downstream author service used to create a linked author profile for every new
//! account. Leaving `AUTHOR_SERVICE_URL` unset disables provisioning.

use std::env;
use std::time::Duration;

use crate::{ConfigError, parse_or};

#[derive(Clone, Debug)]
pub struct ProvisioningConfig {
    pub author_service_url: Option<String>,
    pub timeout: Duration,
}

impl ProvisioningConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let author_service_url = lookup("AUTHOR_SERVICE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        if let Some(url) = &author_service_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Invalid {
                    name: "AUTHOR_SERVICE_URL",
                    reason: "must start with http:// or https://".to_string(),
                });
            }
        }

        let timeout_secs: u64 = parse_or(&lookup, "AUTHOR_SERVICE_TIMEOUT_SECS", 5)?;

        Ok(Self {
            author_service_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.author_service_url.is_some()
    }
}
