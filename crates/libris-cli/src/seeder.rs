//! Initial account seeding and one-off account management.
//!
//! Accounts created here follow the same field rules as registration. Seeding is
//! idempotent: an existing username is skipped, but its author profile is still
//! requested so a previously failed provisioning call gets another chance.

use anyhow::{Context, bail};
use tracing::{info, warn};
use validator::Validate;

use libris::provisioning::ProfileProvisioner;
use libris_config::{SeedAccount, SeedConfig};
use libris_core::hash_password_with_cost;
use libris_db::UserStore;
use libris_models::{NewUser, RegisterRequest, User, UserRole};

/// Email domain for seeded accounts, which only carry a username.
pub const SEED_EMAIL_DOMAIN: &str = "libris.local";

#[derive(Clone)]
pub struct AccountSpec {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

impl AccountSpec {
    pub fn from_seed(account: &SeedAccount, role: UserRole) -> Self {
        Self {
            username: account.username.clone(),
            email: format!("{}@{}", account.username, SEED_EMAIL_DOMAIN),
            password: account.password.clone(),
            role,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: Vec<String>,
    pub skipped: Vec<String>,
}

/// Validates `spec` with the registration rules and inserts it.
pub async fn create_account(
    users: &dyn UserStore,
    spec: &AccountSpec,
    bcrypt_cost: u32,
) -> anyhow::Result<User> {
    let email = spec.email.trim().to_lowercase();
    RegisterRequest {
        username: spec.username.clone(),
        email: email.clone(),
        password: spec.password.clone(),
    }
    .validate()
    .map_err(|e| anyhow::anyhow!(libris_core::errors::format_validation_errors(&e)))?;

    if users.get_by_email(&email).await?.is_some() {
        bail!("Email {} already registered", email);
    }
    if users.get_by_username(&spec.username).await?.is_some() {
        bail!("Username {} already taken", spec.username);
    }

    let password_hash = hash_password_with_cost(&spec.password, bcrypt_cost)?;
    let user = users
        .create(&NewUser {
            username: spec.username.clone(),
            email,
            password_hash,
            role: spec.role,
        })
        .await
        .with_context(|| format!("Failed to create {}", spec.username))?;

    info!(user_id = %user.id, role = %user.role, "Account created");
    Ok(user)
}

/// Creates the accounts named by `config`, skipping usernames that already exist.
pub async fn seed_accounts(
    users: &dyn UserStore,
    provisioner: &dyn ProfileProvisioner,
    config: &SeedConfig,
    bcrypt_cost: u32,
) -> anyhow::Result<SeedReport> {
    let mut report = SeedReport::default();

    let accounts = [
        config.admin.as_ref().map(|a| AccountSpec::from_seed(a, UserRole::Admin)),
        config.user.as_ref().map(|a| AccountSpec::from_seed(a, UserRole::User)),
    ];

    for spec in accounts.into_iter().flatten() {
        let user = match users.get_by_username(&spec.username).await? {
            Some(existing) => {
                info!(username = %spec.username, "Account exists, skipping");
                report.skipped.push(spec.username.clone());
                existing
            }
            None => {
                let user = create_account(users, &spec, bcrypt_cost).await?;
                report.created.push(spec.username.clone());
                user
            }
        };

        if let Err(e) = provisioner.provision(&user).await {
            warn!(username = %user.username, error = %e, "Failed to seed author profile");
        }
    }

    Ok(report)
}

pub async fn set_role(users: &dyn UserStore, username: &str, role: UserRole) -> anyhow::Result<User> {
    users
        .update_role(username, role)
        .await
        .map_err(|e| match e {
            libris_db::StoreError::NotFound => anyhow::anyhow!("User {} not found", username),
            other => other.into(),
        })
}
