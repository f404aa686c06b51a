//! # Libris Models
//!
//! Data structures shared by the service, the storage layer and the CLI.
//!
//! - [`users`]: the user identity record, its role and the admin management DTOs
//! - [`refresh_tokens`]: persisted refresh token rows
//! - [`auth`]: request/response DTOs for the session endpoints, with validation rules

pub mod auth;
pub mod refresh_tokens;
pub mod users;

pub use auth::{
    LoginIdentifier, LoginRequest, MessageResponse, RefreshTokenRequest, RegisterRequest,
    TokenPairResponse,
};
pub use refresh_tokens::{NewRefreshToken, RefreshToken};
pub use users::{
    CreateUserRequest, NewUser, UpdateUserRequest, User, UserProfile, UserRole, UserUpdate,
};
