//! Forward path for every non-CONNECT method.
//!
//! # Responsibilities
//! - Validate the absolute-form request target
//! - Reissue the request upstream with method, headers and streaming body intact
//! - Hand the upstream response to the transform pipeline

use axum::body::Body;
use axum::http::{Request, Uri};
use axum::response::Response;
use url::Url;

use crate::http::error::ProxyError;
use crate::http::response::client_headers;
use crate::http::server::ProxyState;
use crate::transform::policy::client_accepts_gzip;

/// Parse the request target as an absolute URL.
///
/// Origin-form targets (`/path`) have no host to forward to and are rejected.
pub fn parse_target(uri: &Uri) -> Result<Url, ProxyError> {
    Url::parse(&uri.to_string()).map_err(|e| {
        tracing::debug!(uri = %uri, error = %e, "Rejecting request target");
        ProxyError::BadTarget
    })
}

/// Execute `request` against its origin and build the client response.
pub async fn forward(state: &ProxyState, request: Request<Body>) -> Result<Response, ProxyError> {
    let target = parse_target(request.uri())?;
    let uri: Uri = target.as_str().parse().map_err(|_| ProxyError::BadTarget)?;

    // Read before the headers move into the outbound request.
    let accepts_gzip = client_accepts_gzip(request.headers());

    let (parts, body) = request.into_parts();
    let mut outbound = Request::new(body);
    *outbound.method_mut() = parts.method;
    *outbound.uri_mut() = uri;
    *outbound.headers_mut() = parts.headers;

    let upstream = state.client.request(outbound).await.map_err(|e| {
        tracing::error!(url = %target, error = %e, "Backend request failed");
        if e.is_connect() {
            ProxyError::UpstreamUnavailable(Box::new(e))
        } else {
            ProxyError::UpstreamProtocol(Box::new(e))
        }
    })?;

    let (parts, body) = upstream.into_parts();
    state
        .pipeline
        .transform_and_write(
            accepts_gzip,
            parts.status,
            client_headers(parts.headers),
            Body::new(body),
            target.as_str(),
        )
        .await
}
