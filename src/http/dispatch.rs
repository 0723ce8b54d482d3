//! Method-based request dispatch.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request};
use axum::response::{IntoResponse, Response};

use crate::http::error::ProxyError;
use crate::http::server::ProxyState;
use crate::http::{forward, tunnel};

/// Where a request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Tunnel,
    Forward,
    Unsupported,
}

/// Classify a request method.
pub fn route(method: &Method) -> Route {
    match *method {
        Method::CONNECT => Route::Tunnel,
        Method::GET
        | Method::HEAD
        | Method::POST
        | Method::PUT
        | Method::PATCH
        | Method::DELETE
        | Method::OPTIONS => Route::Forward,
        _ => Route::Unsupported,
    }
}

/// Fallback handler for every inbound request.
pub async fn dispatch(State(state): State<ProxyState>, request: Request<Body>) -> Response {
    match route(request.method()) {
        Route::Tunnel => tunnel::establish(&state, request).await.into_response(),
        Route::Forward => forward::forward(&state, request).await.into_response(),
        Route::Unsupported => {
            let method = request.method().clone();
            tracing::info!(
                method = %method,
                uri = %request.uri(),
                "Not sure how to do a {} request for {}",
                method,
                request.uri()
            );
            ProxyError::UnsupportedMethod(method).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes() {
        assert_eq!(route(&Method::CONNECT), Route::Tunnel);
        for method in [
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ] {
            assert_eq!(route(&method), Route::Forward, "{method}");
        }
        assert_eq!(route(&Method::TRACE), Route::Unsupported);
        assert_eq!(route(&Method::from_bytes(b"PURGE").unwrap()), Route::Unsupported);
    }
}
