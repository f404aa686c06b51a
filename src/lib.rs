//! # Libris Auth
//!
//! Authentication service of the Libris backend. It issues short-lived access tokens
//! and single-use rotating refresh tokens, and exposes the verification middleware
//! used by protected routes.
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── middleware/       # Bearer token verification and role checks
//! ├── modules/
//! │   ├── auth/        # register, login, refresh-token, logout
//! │   └── users/       # profile lookups
//! ├── provisioning.rs   # best-effort author profile creation
//! ├── logging.rs        # subscriber setup and request logging
//! ├── metrics.rs        # Prometheus recorder and business counters
//! ├── router.rs         # route tree and tower layers
//! ├── state.rs          # shared handles
//! └── validator.rs      # ValidatedJson extractor
//! ```
//!
//! Storage, token signing, configuration and the error taxonomy live in the
//! `libris-*` workspace crates.
//!
//! ## Tokens
//!
//! - **Access token**: HS256 JWT (default 1 hour) carrying `sub`, `username`, `email`,
//!   `role`. Any service holding the signing secret can verify it locally.
//! - **Refresh token**: opaque 32-byte random value (default 7 days). Redeemable once;
//!   every issuance invalidates the previous one.

pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod provisioning;
pub mod router;
pub mod state;
pub mod validator;

// Re-export workspace crates for convenience
pub use libris_auth;
pub use libris_config;
pub use libris_core;
pub use libris_db;
pub use libris_models;
