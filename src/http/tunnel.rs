//! CONNECT tunnel establishment.
//!
//! # Responsibilities
//! - Dial the authority-form target before acknowledging
//! - Take over the client connection through a hyper upgrade
//! - Relay bytes between both ends in a background task
//!
//! # Design Decisions
//! - The acknowledgement is an `HTTP/1.0 200 OK` with an empty body
//! - Relay outcome is reported through tracing only; the client already has its 200

use axum::body::Body;
use axum::http::{Request, Version};
use axum::response::Response;
use hyper::upgrade::OnUpgrade;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use crate::http::error::ProxyError;
use crate::http::server::ProxyState;
use crate::net::relay;

/// The `host:port` a CONNECT request names.
fn tunnel_target(request: &Request<Body>) -> String {
    match request.uri().authority() {
        Some(authority) => authority.to_string(),
        None => request.uri().to_string(),
    }
}

/// Open a tunnel for a CONNECT request.
pub async fn establish(state: &ProxyState, mut request: Request<Body>) -> Result<Response, ProxyError> {
    let target = tunnel_target(&request);

    let upstream = match TcpStream::connect(&target).await {
        Ok(stream) => stream,
        Err(source) => {
            tracing::warn!(dest = %target, error = %source, "Tunnel dial failed");
            return Err(ProxyError::TunnelDial { target, source });
        }
    };

    if request.extensions().get::<OnUpgrade>().is_none() {
        tracing::error!(dest = %target, "Client connection cannot be upgraded");
        return Err(ProxyError::UpgradeUnsupported);
    }
    let on_upgrade = hyper::upgrade::on(&mut request);

    let guard = state.tunnels.track();
    let buffer_size = state.tunnel.relay_buffer_bytes;
    tokio::spawn(async move {
        let client = match on_upgrade.await {
            Ok(upgraded) => TokioIo::new(upgraded),
            Err(e) => {
                tracing::warn!(tunnel_id = %guard.id(), dest = %target, error = %e, "Upgrade failed");
                return;
            }
        };

        tracing::info!(tunnel_id = %guard.id(), "Connected to {target}");
        let report = relay(client, upstream, buffer_size).await;
        if let Err(e) = &report.a_to_b {
            tracing::debug!(tunnel_id = %guard.id(), error = %e, "Client to target copy ended with error");
        }
        if let Err(e) = &report.b_to_a {
            tracing::debug!(tunnel_id = %guard.id(), error = %e, "Target to client copy ended with error");
        }
        tracing::info!(
            tunnel_id = %guard.id(),
            sent = report.a_to_b_bytes(),
            received = report.b_to_a_bytes(),
            "Finished with {target}"
        );
    });

    let mut response = Response::new(Body::empty());
    *response.version_mut() = Version::HTTP_10;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_is_authority() {
        let request = Request::builder()
            .method("CONNECT")
            .uri("example.com:443")
            .body(Body::empty())
            .unwrap();
        assert_eq!(tunnel_target(&request), "example.com:443");
    }

    #[tokio::test]
    async fn test_request_without_upgrade_is_rejected() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let request = Request::builder()
            .method("CONNECT")
            .uri(addr.to_string())
            .body(Body::empty())
            .unwrap();

        let state = ProxyState::new(&crate::config::ProxyConfig::default());
        let result = establish(&state, request).await;
        assert!(matches!(result, Err(ProxyError::UpgradeUnsupported)));
        assert_eq!(state.tunnels.active_count(), 0);
    }

    #[tokio::test]
    async fn test_dial_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let request = Request::builder()
            .method("CONNECT")
            .uri(addr.to_string())
            .body(Body::empty())
            .unwrap();

        let state = ProxyState::new(&crate::config::ProxyConfig::default());
        let result = establish(&state, request).await;
        match result {
            Err(ProxyError::TunnelDial { target, .. }) => assert_eq!(target, addr.to_string()),
            Err(other) => panic!("expected dial failure, got {other}"),
            Ok(_) => panic!("expected dial failure"),
        }
    }
}
