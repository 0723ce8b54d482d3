//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (buffer sizes > 0, bind address parses)
//! - Check that enabled middleware has what it needs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{MiddlewareKind, ProxyConfig};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("middleware {0:?} is listed more than once")]
    DuplicateMiddleware(MiddlewareKind),

    #[error("authentication middleware is enabled but auth.users is empty")]
    NoUsers,

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let mut seen = HashSet::new();
    for kind in &config.middleware {
        if !seen.insert(*kind) {
            errors.push(ValidationError::DuplicateMiddleware(*kind));
        }
    }

    if seen.contains(&MiddlewareKind::Authentication) && config.auth.users.is_empty() {
        errors.push(ValidationError::NoUsers);
    }

    if config.tunnel.relay_buffer_bytes == 0 {
        errors.push(ValidationError::Zero("tunnel.relay_buffer_bytes"));
    }
    if config.transform.max_html_token_bytes == 0 {
        errors.push(ValidationError::Zero("transform.max_html_token_bytes"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
