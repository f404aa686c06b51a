//! # Libris CLI
//!
//! Account administration used by the `libris-cli` binary.
//!
//! ## Usage
//!
//! ```ignore
//! use libris_cli::seeder::seed_accounts;
//!
//! let report = seed_accounts(&users, provisioner.as_ref(), &SeedConfig::from_env(), cost).await?;
//! ```

pub mod seeder;
