//! Session issuance engine.
//!
//! Every successful register, login or refresh ends in [`SessionService::issue_pair`],
//! which signs an access token and rotates the caller's refresh token through
//! [`RefreshTokenStore::rotate`]. Rotation is strict: after any issuance the user has
//! exactly one redeemable refresh token, and a redeemed token can never be redeemed
//! again.

use std::sync::{Arc, OnceLock};

use chrono::{Duration, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use libris_auth::{Subject, TokenSigner, generate_refresh_token, hash_refresh_token};
use libris_core::{AppError, DEFAULT_BCRYPT_COST, hash_password_with_cost, verify_password};
use libris_db::{RefreshTokenStore, StoreError, UserStore};
use libris_models::{
    LoginIdentifier, LoginRequest, NewRefreshToken, NewUser, RefreshTokenRequest,
    RegisterRequest, TokenPairResponse, User, UserRole,
};

use crate::metrics::{
    track_refresh_rejected, track_tokens_issued, track_user_login_failure,
    track_user_login_success, track_user_registered,
};
use crate::modules::users::service::{EMAIL_TAKEN, USERNAME_TAKEN, identity_conflict};
use crate::provisioning::{ProfileProvisioner, spawn_provisioning};

const INVALID_CREDENTIALS: &str = "Invalid Credentials";
const INVALID_REFRESH_TOKEN: &str = "Invalid Refresh Token";
const DUMMY_PASSWORD: &str = "libris-unknown-account";

pub struct SessionService {
    users: Arc<dyn UserStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    signer: Arc<TokenSigner>,
    refresh_ttl: Duration,
    provisioner: Arc<dyn ProfileProvisioner>,
    bcrypt_cost: u32,
    /// Verified against when the login identifier matches no user, so both branches
    /// pay for one bcrypt comparison at the configured cost.
    dummy_hash: OnceLock<String>,
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        signer: Arc<TokenSigner>,
        refresh_ttl_hours: i64,
        provisioner: Arc<dyn ProfileProvisioner>,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            signer,
            refresh_ttl: Duration::hours(refresh_ttl_hours),
            provisioner,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            dummy_hash: OnceLock::new(),
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self.dummy_hash = OnceLock::new();
        self
    }

    fn dummy_hash(&self) -> Result<&str, AppError> {
        if let Some(hash) = self.dummy_hash.get() {
            return Ok(hash);
        }
        let hash = hash_password_with_cost(DUMMY_PASSWORD, self.bcrypt_cost)?;
        Ok(self.dummy_hash.get_or_init(|| hash))
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> Result<TokenPairResponse, AppError> {
        request.validate()?;

        let username = request.username.trim().to_string();
        let email = request.email.trim().to_lowercase();

        if self.users.get_by_email(&email).await?.is_some() {
            return Err(AppError::conflict(EMAIL_TAKEN));
        }
        if self.users.get_by_username(&username).await?.is_some() {
            return Err(AppError::conflict(USERNAME_TAKEN));
        }

        let password_hash = hash_password_with_cost(&request.password, self.bcrypt_cost)?;

        let user = self
            .users
            .create(&NewUser {
                username,
                email,
                password_hash,
                role: UserRole::User,
            })
            .await
            // Lost a race with a concurrent registration for the same identity.
            .map_err(identity_conflict)?;

        let pair = self.issue_pair(&user, None).await?;

        info!(user_id = %user.id, "User registered");
        track_user_registered();
        track_tokens_issued("register");

        spawn_provisioning(self.provisioner.clone(), user);

        Ok(pair)
    }

    #[instrument(skip(self, request), fields(identifier = %request.username_or_email))]
    pub async fn login(&self, request: LoginRequest) -> Result<TokenPairResponse, AppError> {
        request.validate()?;

        let user = match request.identifier() {
            LoginIdentifier::Email(email) => {
                self.users.get_by_email(&email.to_lowercase()).await?
            }
            LoginIdentifier::Username(username) => self.users.get_by_username(username).await?,
        };

        let Some(user) = user else {
            verify_password(&request.password, self.dummy_hash()?)?;
            debug!("Login rejected: unknown identifier");
            track_user_login_failure();
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };

        if !verify_password(&request.password, &user.password_hash)? {
            debug!(user_id = %user.id, "Login rejected: password mismatch");
            track_user_login_failure();
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        let pair = self.issue_pair(&user, None).await?;

        info!(user_id = %user.id, "User logged in");
        track_user_login_success(user.role.as_str());
        track_tokens_issued("login");

        Ok(pair)
    }

    #[instrument(skip_all)]
    pub async fn refresh(
        &self,
        request: RefreshTokenRequest,
    ) -> Result<TokenPairResponse, AppError> {
        request.validate()?;
        let value = request.refresh_token.as_str();

        let token = match self.refresh_tokens.get_by_token(value).await {
            Ok(token) => token,
            Err(StoreError::NotFound) => return Err(reject_refresh("not_found")),
            Err(e) => return Err(e.into()),
        };

        let now = Utc::now();
        if token.is_used() {
            return Err(reject_refresh("used"));
        }
        if token.invalid {
            return Err(reject_refresh("invalid"));
        }
        if token.is_expired_at(now) {
            return Err(reject_refresh("expired"));
        }

        let user = self.users.get_by_id(token.user_id).await?.ok_or_else(|| {
            AppError::internal(format!("refresh token owner {} missing", token.user_id))
        })?;

        let pair = self.issue_pair(&user, Some(value)).await?;

        info!(user_id = %user.id, "Session refreshed");
        track_tokens_issued("refresh");

        Ok(pair)
    }

    /// Revokes every live refresh token of `user_id`. Access tokens already issued stay
    /// valid until they expire.
    #[instrument(skip(self))]
    pub async fn logout(&self, user_id: Uuid) -> Result<u64, AppError> {
        let revoked = self.refresh_tokens.invalidate_many_by_owner(user_id).await?;
        info!(revoked, "User logged out");
        Ok(revoked)
    }

    /// Signs an access token for `user` and atomically replaces their refresh token.
    ///
    /// With `redeemed`, that token is consumed in the same transaction; losing the race
    /// for it is reported as an invalid refresh token.
    async fn issue_pair(
        &self,
        user: &User,
        redeemed: Option<&str>,
    ) -> Result<TokenPairResponse, AppError> {
        let access_token = self.signer.issue(&Subject {
            user_id: user.id,
            username: &user.username,
            email: &user.email,
            role: user.role.as_str(),
        })?;

        let refresh_token = generate_refresh_token();
        let now = Utc::now();
        let replacement = NewRefreshToken {
            token_hash: hash_refresh_token(&refresh_token),
            user_id: user.id,
            issued_at: now,
            expires_at: now + self.refresh_ttl,
        };

        match self.refresh_tokens.rotate(user.id, redeemed, &replacement).await {
            Ok(_) => {}
            Err(StoreError::Stale) => return Err(reject_refresh("lost_race")),
            Err(e) => return Err(e.into()),
        }

        Ok(TokenPairResponse::bearer(
            access_token,
            refresh_token,
            self.signer.access_token_ttl_secs(),
        ))
    }
}

fn reject_refresh(reason: &'static str) -> AppError {
    warn!(reason, "Refresh token rejected");
    track_refresh_rejected(reason);
    AppError::unauthorized(INVALID_REFRESH_TOKEN).with_detail(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_config::JwtConfig;
    use libris_core::ErrorKind;
    use libris_db::{MemoryRefreshTokenStore, MemoryUserStore};

    use crate::provisioning::NoopProvisioner;

    const TEST_COST: u32 = 4;

    struct Harness {
        service: Arc<SessionService>,
        users: Arc<MemoryUserStore>,
        tokens: Arc<MemoryRefreshTokenStore>,
        signer: Arc<TokenSigner>,
    }

    fn harness() -> Harness {
        let users = Arc::new(MemoryUserStore::new());
        let tokens = Arc::new(MemoryRefreshTokenStore::new());
        let signer = Arc::new(TokenSigner::new(&JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_ttl_hours: 1,
            refresh_token_ttl_hours: 168,
        }));
        let service = SessionService::new(
            users.clone(),
            tokens.clone(),
            signer.clone(),
            168,
            Arc::new(NoopProvisioner),
        )
        .with_bcrypt_cost(TEST_COST);

        Harness {
            service: Arc::new(service),
            users,
            tokens,
            signer,
        }
    }

    fn register_request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "Passw0rd!".to_string(),
        }
    }

    fn login_request(identifier: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username_or_email: identifier.to_string(),
            password: password.to_string(),
        }
    }

    fn refresh_request(value: &str) -> RefreshTokenRequest {
        RefreshTokenRequest {
            refresh_token: value.to_string(),
        }
    }

    fn assert_invalid_refresh(err: AppError) {
        assert_eq!(err.kind, ErrorKind::Authentication);
        assert_eq!(err.message, INVALID_REFRESH_TOKEN);
    }

    #[tokio::test]
    async fn test_session_lifecycle_scenario() {
        let h = harness();

        let first = h
            .service
            .register(register_request("alice", "alice@x.com"))
            .await
            .unwrap();
        let claims = h.signer.verify(&first.access_token).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@x.com");
        assert_eq!(claims.role, "user");

        let second = h
            .service
            .refresh(refresh_request(&first.refresh_token))
            .await
            .unwrap();
        assert!(h.signer.verify(&second.access_token).is_ok());
        assert_ne!(second.refresh_token, first.refresh_token);

        // refreshA is single use
        let err = h
            .service
            .refresh(refresh_request(&first.refresh_token))
            .await
            .unwrap_err();
        assert_invalid_refresh(err);

        // A new login supersedes refreshB
        let third = h
            .service
            .login(login_request("alice", "Passw0rd!"))
            .await
            .unwrap();
        let err = h
            .service
            .refresh(refresh_request(&second.refresh_token))
            .await
            .unwrap_err();
        assert_invalid_refresh(err);
        assert!(
            h.service
                .refresh(refresh_request(&third.refresh_token))
                .await
                .is_ok()
        );

        let err = h
            .service
            .register(register_request("alice2", "alice@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_register_conflicts() {
        let h = harness();
        h.service
            .register(register_request("alice", "alice@x.com"))
            .await
            .unwrap();

        let err = h
            .service
            .register(register_request("alice", "other@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.message, "Username already taken");

        // Email is checked first and compared case-insensitively.
        let err = h
            .service
            .register(register_request("alice", "ALICE@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Email already registered");
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_fields() {
        let h = harness();
        let mut request = register_request("alice", "alice@x.com");
        request.password = "weak".to_string();

        let err = h.service.register(request).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(h.users.get_by_username("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_password() {
        let h = harness();
        h.service
            .register(register_request("alice", "alice@x.com"))
            .await
            .unwrap();

        let user = h.users.get_by_username("alice").await.unwrap().unwrap();
        assert_ne!(user.password_hash, "Passw0rd!");
        assert!(verify_password("Passw0rd!", &user.password_hash).unwrap());
        assert_eq!(user.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_login_by_username_or_email() {
        let h = harness();
        h.service
            .register(register_request("alice", "alice@x.com"))
            .await
            .unwrap();

        assert!(h.service.login(login_request("alice", "Passw0rd!")).await.is_ok());
        assert!(
            h.service
                .login(login_request("Alice@X.com", "Passw0rd!"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_login_failures_share_one_message() {
        let h = harness();
        h.service
            .register(register_request("alice", "alice@x.com"))
            .await
            .unwrap();

        let wrong_password = h
            .service
            .login(login_request("alice", "Wr0ngPass"))
            .await
            .unwrap_err();
        let unknown_user = h
            .service
            .login(login_request("bob", "Passw0rd!"))
            .await
            .unwrap_err();
        let unknown_email = h
            .service
            .login(login_request("bob@x.com", "Passw0rd!"))
            .await
            .unwrap_err();

        for err in [wrong_password, unknown_user, unknown_email] {
            assert_eq!(err.kind, ErrorKind::Authentication);
            assert_eq!(err.message, INVALID_CREDENTIALS);
        }
    }

    #[tokio::test]
    async fn test_unknown_identifier_pays_for_a_bcrypt_comparison() {
        const COST: u32 = 10;
        let users = Arc::new(MemoryUserStore::new());
        let signer = Arc::new(TokenSigner::new(&JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_ttl_hours: 1,
            refresh_token_ttl_hours: 168,
        }));
        let service = SessionService::new(
            users,
            Arc::new(MemoryRefreshTokenStore::new()),
            signer,
            168,
            Arc::new(NoopProvisioner),
        )
        .with_bcrypt_cost(COST);
        service
            .register(register_request("alice", "alice@x.com"))
            .await
            .unwrap();

        // The first miss also builds the dummy hash; time the steady state.
        assert!(service.login(login_request("bob", "Wr0ngPass")).await.is_err());
        assert!(service.dummy_hash.get().unwrap().starts_with("$2b$10$"));

        let started = std::time::Instant::now();
        assert!(service.login(login_request("alice", "Wr0ngPass")).await.is_err());
        let known = started.elapsed();

        let started = std::time::Instant::now();
        assert!(service.login(login_request("bob", "Wr0ngPass")).await.is_err());
        let unknown = started.elapsed();

        assert!(
            unknown * 4 >= known,
            "unknown user {:?}, known user {:?}",
            unknown,
            known
        );
        assert!(unknown >= std::time::Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_each_issuance_leaves_one_live_token() {
        let h = harness();
        h.service
            .register(register_request("alice", "alice@x.com"))
            .await
            .unwrap();
        let user = h.users.get_by_username("alice").await.unwrap().unwrap();

        for _ in 0..3 {
            h.service
                .login(login_request("alice", "Passw0rd!"))
                .await
                .unwrap();
            assert_eq!(h.tokens.live_count(user.id).await, 1);
        }
        assert_eq!(h.tokens.tokens_for(user.id).await.len(), 4);
    }

    #[tokio::test]
    async fn test_refresh_rejects_unknown_and_expired_tokens() {
        let h = harness();
        assert_invalid_refresh(
            h.service
                .refresh(refresh_request("not-a-real-token"))
                .await
                .unwrap_err(),
        );

        h.service
            .register(register_request("alice", "alice@x.com"))
            .await
            .unwrap();
        let user = h.users.get_by_username("alice").await.unwrap().unwrap();

        let issued_at = Utc::now() - Duration::hours(2);
        h.tokens
            .create(&NewRefreshToken {
                token_hash: hash_refresh_token("stale-value"),
                user_id: user.id,
                issued_at,
                expires_at: issued_at + Duration::hours(1),
            })
            .await
            .unwrap();

        assert_invalid_refresh(
            h.service
                .refresh(refresh_request("stale-value"))
                .await
                .unwrap_err(),
        );
    }

    #[tokio::test]
    async fn test_refresh_with_missing_owner_is_internal() {
        let h = harness();
        let now = Utc::now();
        h.tokens
            .create(&NewRefreshToken {
                token_hash: hash_refresh_token("orphan"),
                user_id: Uuid::new_v4(),
                issued_at: now,
                expires_at: now + Duration::hours(1),
            })
            .await
            .unwrap();

        let err = h.service.refresh(refresh_request("orphan")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_concurrent_refresh_has_single_winner() {
        let h = harness();
        let pair = h
            .service
            .register(register_request("alice", "alice@x.com"))
            .await
            .unwrap();
        let user = h.users.get_by_username("alice").await.unwrap().unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let service = h.service.clone();
                let value = pair.refresh_token.clone();
                tokio::spawn(async move { service.refresh(refresh_request(&value)).await })
            })
            .collect();

        let mut wins = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(err) => assert_invalid_refresh(err),
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(h.tokens.live_count(user.id).await, 1);
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh_token() {
        let h = harness();
        let pair = h
            .service
            .register(register_request("alice", "alice@x.com"))
            .await
            .unwrap();
        let user_id = h.signer.verify(&pair.access_token).unwrap().user_id().unwrap();

        assert_eq!(h.service.logout(user_id).await.unwrap(), 1);
        assert_eq!(h.service.logout(user_id).await.unwrap(), 0);
        assert_invalid_refresh(
            h.service
                .refresh(refresh_request(&pair.refresh_token))
                .await
                .unwrap_err(),
        );
    }
}
