//! Middleware wrapping the dispatcher.
//!
//! # Design Decisions
//! - The chain is an explicit list, outermost first
//! - Each entry becomes one tower layer on the router

pub mod auth;
pub mod logging;

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::Router;

use crate::config::{MiddlewareKind, ProxyConfig};

pub use auth::{authenticate, AuthError, Authenticator};
pub use logging::request_logging;

/// One configured middleware.
#[derive(Debug, Clone)]
pub enum Middleware {
    Logging,
    Authentication(Arc<Authenticator>),
}

impl Middleware {
    pub fn kind(&self) -> MiddlewareKind {
        match self {
            Self::Logging => MiddlewareKind::Logging,
            Self::Authentication(_) => MiddlewareKind::Authentication,
        }
    }
}

/// Ordered middleware list, outermost first.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareChain {
    middleware: Vec<Middleware>,
}

impl MiddlewareChain {
    pub fn new(middleware: Vec<Middleware>) -> Self {
        Self { middleware }
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        let middleware = config
            .middleware
            .iter()
            .map(|kind| match kind {
                MiddlewareKind::Logging => Middleware::Logging,
                MiddlewareKind::Authentication => {
                    Middleware::Authentication(Arc::new(Authenticator::from_config(&config.auth)))
                }
            })
            .collect();
        Self::new(middleware)
    }

    pub fn kinds(&self) -> Vec<MiddlewareKind> {
        self.middleware.iter().map(Middleware::kind).collect()
    }

    /// Wrap `router` so the first entry of the chain sees requests first.
    pub fn wrap(&self, router: Router) -> Router {
        self.middleware
            .iter()
            .rev()
            .fold(router, |router, middleware| match middleware {
                Middleware::Logging => request_logging(router),
                Middleware::Authentication(auth) => {
                    router.layer(from_fn_with_state(Arc::clone(auth), authenticate))
                }
            })
    }
}
