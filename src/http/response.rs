//! Response header conventions shared by the forward path.
//!
//! # Responsibilities
//! - Copy upstream response headers for the client
//! - Stamp every forwarded response with the proxy identification header

use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Identification header set on every forwarded response.
pub const PROXY_ID_HEADER: HeaderName = HeaderName::from_static("x-rob-proxy");

/// Value of [`PROXY_ID_HEADER`].
pub const PROXY_ID_VALUE: HeaderValue = HeaderValue::from_static("0.1");

/// Copy every upstream header and set the identification header exactly once.
pub fn client_headers(mut upstream: HeaderMap) -> HeaderMap {
    upstream.insert(PROXY_ID_HEADER, PROXY_ID_VALUE);
    upstream
}
