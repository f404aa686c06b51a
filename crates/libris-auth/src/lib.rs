//! # Libris Auth
//!
//! Token primitives shared by the auth service and by every downstream service that
//! needs to check a caller's identity.
//!
//! - [`claims`]: the identity claims carried by an access token
//! - [`jwt`]: [`TokenSigner`], the HS256 signer/verifier built from an injected secret
//! - [`refresh`]: generation and storage hashing of opaque refresh token values
//!
//! # Token Types
//!
//! - **Access token**: short-lived compact JWS, verified locally from the shared secret.
//!   No storage is consulted, so any service holding the secret can authenticate callers.
//! - **Refresh token**: an opaque random string with no embedded claims. Only its SHA-256
//!   digest is stored; redemption is a server-side lookup.
//!
//! # Example
//!
//! ```ignore
//! use libris_auth::{Subject, TokenSigner};
//! use libris_config::JwtConfig;
//!
//! let signer = TokenSigner::new(&JwtConfig::from_env()?);
//! let token = signer.issue(&Subject {
//!     user_id,
//!     username: "alice",
//!     email: "alice@x.com",
//!     role: "user",
//! })?;
//! let claims = signer.verify(&token)?;
//! assert_eq!(claims.username, "alice");
//! ```

pub mod claims;
pub mod jwt;
pub mod refresh;

pub use claims::{Claims, Subject};
pub use jwt::{TokenSigner, verify_token};
pub use refresh::{generate_refresh_token, hash_refresh_token};
