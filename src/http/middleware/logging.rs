//! Request start/end logging on top of `tower_http::trace`.
//!
//! # Design Decisions
//! - Every request gets a `request` span carrying method and URI
//! - The end record is emitted once the response head is ready; streamed
//!   bodies may still be in flight
//! - 5xx responses are not logged a second time as failures; the handler that
//!   produced them already did

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    response::Response,
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::Span;

/// Wrap `router` with start/end request logging.
pub fn request_logging(router: Router) -> Router {
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(request_span)
            .on_request(log_start)
            .on_response(log_end)
            .on_failure(()),
    )
}

fn request_span(request: &Request<Body>) -> Span {
    tracing::info_span!("request", method = %request.method(), uri = %request.uri())
}

fn log_start(request: &Request<Body>, _span: &Span) {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    tracing::info!(
        method = %request.method(),
        uri = %request.uri(),
        peer = %peer,
        "Start"
    );
}

fn log_end(response: &Response, latency: Duration, _span: &Span) {
    tracing::info!(
        status = response.status().as_u16(),
        elapsed_ms = latency.as_millis() as u64,
        "End"
    );
}
