//! Security subsystem.
//!
//! # Design Decisions
//! - Credentials are loaded once from config and never mutated
//! - Fail closed: a request without a verified user never reaches the dispatcher

pub mod credentials;

pub use credentials::CredentialStore;
