use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;

use libris_auth::TokenSigner;
use libris_config::{CorsConfig, JwtConfig, PasswordConfig, ProvisioningConfig};
use libris_db::{PgRefreshTokenStore, PgUserStore, RefreshTokenStore, UserStore};

use crate::modules::auth::service::SessionService;
use crate::modules::users::service::UserService;
use crate::provisioning::{ProfileProvisioner, ProvisioningError, provisioner_from_config};

/// Shared, immutable handles for request handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionService>,
    pub users: Arc<UserService>,
    pub signer: Arc<TokenSigner>,
    pub cors_config: CorsConfig,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Wires the services over arbitrary store implementations.
    pub fn new(
        user_store: Arc<dyn UserStore>,
        token_store: Arc<dyn RefreshTokenStore>,
        provisioner: Arc<dyn ProfileProvisioner>,
        jwt_config: &JwtConfig,
        password_config: &PasswordConfig,
        cors_config: CorsConfig,
    ) -> Self {
        let signer = Arc::new(TokenSigner::new(jwt_config));
        let session = SessionService::new(
            user_store.clone(),
            token_store,
            signer.clone(),
            jwt_config.refresh_token_ttl_hours,
            provisioner,
        )
        .with_bcrypt_cost(password_config.bcrypt_cost);

        Self {
            session: Arc::new(session),
            users: Arc::new(
                UserService::new(user_store).with_bcrypt_cost(password_config.bcrypt_cost),
            ),
            signer,
            cors_config,
            metrics_handle: None,
        }
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics_handle = handle;
        self
    }
}

/// Production wiring: Postgres stores and the configured provisioner.
pub fn init_app_state(
    pool: PgPool,
    jwt_config: &JwtConfig,
    password_config: &PasswordConfig,
    provisioning_config: &ProvisioningConfig,
    cors_config: CorsConfig,
) -> Result<AppState, ProvisioningError> {
    let provisioner = provisioner_from_config(provisioning_config)?;

    Ok(AppState::new(
        Arc::new(PgUserStore::new(pool.clone())),
        Arc::new(PgRefreshTokenStore::new(pool)),
        provisioner,
        jwt_config,
        password_config,
        cors_config,
    ))
}
