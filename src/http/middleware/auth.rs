//! Basic proxy authentication.
//!
//! # Responsibilities
//! - Decode `Proxy-Authorization: Basic <base64(user:pass)>`
//! - Check the pair against the credential store
//! - Answer failures with a 407 challenge without calling the inner handler
//!
//! # Design Decisions
//! - Every failure gets the same 407; the precise reason is only logged
//! - The authorization header is left in place for the upstream request

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use crate::config::AuthConfig;
use crate::security::CredentialStore;

/// Why a request failed proxy authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing Proxy-Authorization header")]
    Missing,

    #[error("malformed Proxy-Authorization header")]
    Malformed,

    #[error("unsupported authorization scheme {0:?}")]
    UnsupportedScheme(String),

    #[error("invalid base64 credentials: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("credentials have no ':' separator")]
    MissingSeparator,

    #[error("unknown user {0:?}")]
    UnknownUser(String),

    #[error("wrong password for user {0:?}")]
    WrongPassword(String),
}

/// Checks proxy credentials and builds the 407 challenge.
#[derive(Debug)]
pub struct Authenticator {
    credentials: CredentialStore,
    challenge: HeaderValue,
}

impl Authenticator {
    pub fn new(credentials: CredentialStore, realm: &str) -> Self {
        let challenge = HeaderValue::from_str(&format!("basic realm=\"{realm}\""))
            .unwrap_or_else(|_| HeaderValue::from_static("basic"));
        Self {
            credentials,
            challenge,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(CredentialStore::from_config(config), &config.realm)
    }

    /// Validate the `Proxy-Authorization` header, returning the user name.
    pub fn check(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        let value = headers
            .get(header::PROXY_AUTHORIZATION)
            .ok_or(AuthError::Missing)?
            .to_str()
            .map_err(|_| AuthError::Malformed)?;

        let parts: Vec<&str> = value.split(' ').collect();
        let [scheme, encoded] = parts[..] else {
            return Err(AuthError::Malformed);
        };
        if !scheme.eq_ignore_ascii_case("basic") {
            return Err(AuthError::UnsupportedScheme(scheme.to_string()));
        }

        let decoded = STANDARD.decode(encoded)?;
        let decoded = String::from_utf8(decoded).map_err(|_| AuthError::Malformed)?;
        let (user, password) = decoded
            .split_once(':')
            .ok_or(AuthError::MissingSeparator)?;

        match self.credentials.password(user) {
            None => Err(AuthError::UnknownUser(user.to_string())),
            Some(expected) if expected != password => Err(AuthError::WrongPassword(user.to_string())),
            Some(_) => Ok(user.to_string()),
        }
    }

    /// The 407 response sent on any failure.
    pub fn challenge(&self) -> Response {
        (
            StatusCode::PROXY_AUTHENTICATION_REQUIRED,
            [
                (header::PROXY_AUTHENTICATE, self.challenge.clone()),
                (
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; charset=utf-8"),
                ),
            ],
            "Proxy authentication required\n",
        )
            .into_response()
    }
}

/// Middleware rejecting requests without valid proxy credentials.
pub async fn authenticate(
    State(auth): State<Arc<Authenticator>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match auth.check(request.headers()) {
        Ok(user) => {
            tracing::debug!(user = %user, "Proxy authentication succeeded");
            next.run(request).await
        }
        Err(reason) => {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                reason = %reason,
                "Proxy authentication failed"
            );
            auth.challenge()
        }
    }
}
