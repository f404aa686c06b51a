//! # Libris Core
//!
//! Foundational types shared by every Libris crate:
//!
//! - [`errors`]: the tagged error taxonomy and its HTTP translation
//! - [`password`]: salted one-way password hashing and constant-time comparison
//!
//! # Example
//!
//! ```ignore
//! use libris_core::{AppError, hash_password, verify_password};
//!
//! let hash = hash_password("Passw0rd!")?;
//! if !verify_password("Passw0rd!", &hash)? {
//!     return Err(AppError::unauthorized("Invalid Credentials"));
//! }
//! ```

pub mod errors;
pub mod password;

pub use errors::{AppError, ErrorKind};
pub use password::{DEFAULT_BCRYPT_COST, hash_password, hash_password_with_cost, verify_password};
