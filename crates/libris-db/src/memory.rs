//! In-memory stores with the same semantics as the Postgres ones.
//!
//! Each store guards its map with a single [`tokio::sync::Mutex`], which makes every
//! operation (including `rotate`) atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use libris_auth::hash_refresh_token;
use libris_models::{NewRefreshToken, NewUser, RefreshToken, User, UserRole, UserUpdate};

use crate::{RefreshTokenStore, StoreError, UserStore};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: &NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().await;

        if users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict("users_username_key".to_string()));
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn update(&self, id: Uuid, update: &UserUpdate) -> Result<User, StoreError> {
        let mut users = self.users.lock().await;
        if !users.contains_key(&id) {
            return Err(StoreError::NotFound);
        }

        if let Some(username) = &update.username {
            if users.values().any(|u| u.id != id && &u.username == username) {
                return Err(StoreError::Conflict("users_username_key".to_string()));
            }
        }
        if let Some(email) = &update.email {
            if users.values().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::Conflict("users_email_key".to_string()));
            }
        }

        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(username) = &update.username {
            user.username = username.clone();
        }
        if let Some(email) = &update.email {
            user.email = email.clone();
        }
        if let Some(password_hash) = &update.password_hash {
            user.password_hash = password_hash.clone();
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_role(&self, username: &str, role: UserRole) -> Result<User, StoreError> {
        let mut users = self.users.lock().await;
        let user = users
            .values_mut()
            .find(|u| u.username == username)
            .ok_or(StoreError::NotFound)?;

        user.role = role;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[derive(Default)]
pub struct MemoryRefreshTokenStore {
    tokens: Mutex<HashMap<String, RefreshToken>>,
}

impl MemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows owned by `user_id`, oldest first.
    pub async fn tokens_for(&self, user_id: Uuid) -> Vec<RefreshToken> {
        let tokens = self.tokens.lock().await;
        let mut owned: Vec<_> = tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by_key(|t| t.issued_at);
        owned
    }

    pub async fn live_count(&self, user_id: Uuid) -> usize {
        let tokens = self.tokens.lock().await;
        tokens
            .values()
            .filter(|t| t.user_id == user_id && t.is_live())
            .count()
    }
}

fn insert_row(
    tokens: &mut HashMap<String, RefreshToken>,
    token: &NewRefreshToken,
) -> Result<RefreshToken, StoreError> {
    if tokens.contains_key(&token.token_hash) {
        return Err(StoreError::Conflict("refresh_tokens_token_hash_key".to_string()));
    }

    let row = RefreshToken {
        id: Uuid::new_v4(),
        token_hash: token.token_hash.clone(),
        user_id: token.user_id,
        issued_at: token.issued_at,
        expires_at: token.expires_at,
        used_at: None,
        invalid: false,
    };
    tokens.insert(row.token_hash.clone(), row.clone());
    Ok(row)
}

fn invalidate_live(tokens: &mut HashMap<String, RefreshToken>, user_id: Uuid) -> u64 {
    let mut affected = 0;
    for token in tokens.values_mut() {
        if token.user_id == user_id && token.is_live() {
            token.invalid = true;
            affected += 1;
        }
    }
    affected
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn create(&self, token: &NewRefreshToken) -> Result<RefreshToken, StoreError> {
        let mut tokens = self.tokens.lock().await;
        insert_row(&mut tokens, token)
    }

    async fn get_by_token(&self, value: &str) -> Result<RefreshToken, StoreError> {
        let tokens = self.tokens.lock().await;
        tokens
            .get(&hash_refresh_token(value))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn invalidate_many_by_owner(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut tokens = self.tokens.lock().await;
        Ok(invalidate_live(&mut tokens, user_id))
    }

    async fn rotate(
        &self,
        user_id: Uuid,
        redeemed: Option<&str>,
        replacement: &NewRefreshToken,
    ) -> Result<RefreshToken, StoreError> {
        let now = Utc::now();
        let mut tokens = self.tokens.lock().await;

        if tokens.contains_key(&replacement.token_hash) {
            return Err(StoreError::Conflict("refresh_tokens_token_hash_key".to_string()));
        }

        if let Some(value) = redeemed {
            let token = tokens
                .get_mut(&hash_refresh_token(value))
                .filter(|t| t.user_id == user_id && t.is_redeemable_at(now))
                .ok_or(StoreError::Stale)?;
            token.used_at = Some(now);
            token.invalid = true;
        }

        invalidate_live(&mut tokens, user_id);
        insert_row(&mut tokens, replacement)
    }
}
