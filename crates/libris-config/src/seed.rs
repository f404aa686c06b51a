use std::env;

/// An account created by `libris-cli seed` when both its username and password are set.
#[derive(Clone)]
pub struct SeedAccount {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SeedAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedAccount")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, Default)]
pub struct SeedConfig {
    pub admin: Option<SeedAccount>,
    pub user: Option<SeedAccount>,
}

impl SeedConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let account = |user_key: &str, password_key: &str| {
            let username = lookup(user_key).filter(|s| !s.is_empty())?;
            let password = lookup(password_key).filter(|s| !s.is_empty())?;
            Some(SeedAccount { username, password })
        };

        Self {
            admin: account("INITIAL_ADMIN_USERNAME", "INITIAL_ADMIN_PASSWORD"),
            user: account("INITIAL_USER_USERNAME", "INITIAL_USER_PASSWORD"),
        }
    }
}
