//! Errors answered directly by the proxy.

use std::error::Error as StdError;
use std::io;

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// A request the proxy could not complete.
///
/// Each variant maps to one status code; the `Display` text is the response
/// body.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Bad URL")]
    BadTarget,

    #[error("Unknown request method: {0}")]
    UnsupportedMethod(Method),

    #[error("Failed to connect to {target} - {source}")]
    TunnelDial {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to get raw connection for client - connection does not support upgrades")]
    UpgradeUnsupported,

    #[error("Proxy failed with backend request: {}", error_chain(.0.as_ref()))]
    UpstreamUnavailable(Box<dyn StdError + Send + Sync>),

    #[error("Proxy failed with backend request: {}", error_chain(.0.as_ref()))]
    UpstreamProtocol(Box<dyn StdError + Send + Sync>),

    #[error("Failed to get raw server response body: {0}")]
    UpstreamEncoding(#[source] io::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadTarget | Self::UnsupportedMethod(_) => StatusCode::BAD_REQUEST,
            Self::UpgradeUnsupported => StatusCode::INTERNAL_SERVER_ERROR,
            Self::TunnelDial { .. }
            | Self::UpstreamUnavailable(_)
            | Self::UpstreamProtocol(_)
            | Self::UpstreamEncoding(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = format!("{self}\n");
        let mut response = (self.status(), body).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}

/// Render an error with its sources, outermost first.
fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
