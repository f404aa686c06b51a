//! Best-effort creation of the author profile linked to a new account.
//!
//! The author service owns author records; this service only tells it that a user
//! exists. The call runs on a detached task after registration has already
//! succeeded. A failure is logged at `warn` and never retried or rolled back.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use libris_config::ProvisioningConfig;
use libris_models::User;

#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("author service request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("author service responded with status {0}")]
    Rejected(u16),
}

#[async_trait]
pub trait ProfileProvisioner: Send + Sync {
    async fn provision(&self, user: &User) -> Result<(), ProvisioningError>;
}

/// Used when no author service is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProvisioner;

#[async_trait]
impl ProfileProvisioner for NoopProvisioner {
    async fn provision(&self, user: &User) -> Result<(), ProvisioningError> {
        debug!(user_id = %user.id, "Profile provisioning disabled");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CreateAuthorRequest<'a> {
    user_uuid: Uuid,
    first_name: &'a str,
}

/// Creates the author through `POST {base_url}/api/authors`.
#[derive(Debug, Clone)]
pub struct HttpAuthorProvisioner {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAuthorProvisioner {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProvisioningError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/authors", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl ProfileProvisioner for HttpAuthorProvisioner {
    async fn provision(&self, user: &User) -> Result<(), ProvisioningError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&CreateAuthorRequest {
                user_uuid: user.id,
                first_name: &user.username,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProvisioningError::Rejected(status.as_u16()));
        }

        info!(user_id = %user.id, "Author profile provisioned");
        Ok(())
    }
}

/// Picks the provisioner for `config`.
pub fn provisioner_from_config(
    config: &ProvisioningConfig,
) -> Result<Arc<dyn ProfileProvisioner>, ProvisioningError> {
    match &config.author_service_url {
        Some(url) => Ok(Arc::new(HttpAuthorProvisioner::new(url, config.timeout)?)),
        None => Ok(Arc::new(NoopProvisioner)),
    }
}

/// Runs `provisioner` for `user` on a detached task.
pub fn spawn_provisioning(provisioner: Arc<dyn ProfileProvisioner>, user: User) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = provisioner.provision(&user).await {
            warn!(
                user_id = %user.id,
                username = %user.username,
                error = %e,
                "Failed to provision author profile"
            );
        }
    })
}
