use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;

use libris::libris_config::{
    CorsConfig, DatabaseConfig, JwtConfig, PasswordConfig, ProvisioningConfig, ServerConfig,
};
use libris::libris_db::{init_db_pool, run_migrations};
use libris::logging::init_tracing;
use libris::metrics::init_metrics;
use libris::router::init_router;
use libris::state::init_app_state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let jwt_config = JwtConfig::from_env()?;
    let database_config = DatabaseConfig::from_env()?;
    let server_config = ServerConfig::from_env()?;
    let password_config = PasswordConfig::from_env()?;
    let provisioning_config = ProvisioningConfig::from_env()?;
    let cors_config = CorsConfig::from_env();

    let pool = init_db_pool(&database_config)
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    let metrics_handle = init_metrics().context("Failed to install metrics recorder")?;

    if !provisioning_config.is_enabled() {
        info!("AUTHOR_SERVICE_URL not set; author provisioning disabled");
    }

    let state = init_app_state(
        pool,
        &jwt_config,
        &password_config,
        &provisioning_config,
        cors_config,
    )?
    .with_metrics(metrics_handle);
    let app = init_router(state);

    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!(address = %address, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
