//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the shared proxy state from configuration
//! - Mount the dispatcher as the router fallback so every target reaches it
//! - Wrap the dispatcher in the configured middleware chain
//! - Accept connections and serve them with upgrade support until shutdown
//!
//! # Design Decisions
//! - Connections are served by a hand-driven hyper-util accept loop so the
//!   HTTP/1 `Date` header can be switched off; tunnel acknowledgements carry
//!   no headers at all
//! - Shutdown stops accepting, then drains in-flight connections; upgraded
//!   tunnels are detached and not waited for

use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::{body::Body, Router};
use hyper::body::Incoming;
use hyper::Request;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioIo},
    server::{conn::auto, graceful::GracefulShutdown},
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceExt;

use crate::config::{ProxyConfig, TunnelConfig};
use crate::http::dispatch::dispatch;
use crate::http::middleware::MiddlewareChain;
use crate::net::TunnelTracker;
use crate::transform::TransformPipeline;

/// State shared by every request.
#[derive(Clone)]
pub struct ProxyState {
    pub client: Client<HttpConnector, Body>,
    pub pipeline: Arc<TransformPipeline>,
    pub tunnel: TunnelConfig,
    pub tunnels: TunnelTracker,
}

impl ProxyState {
    pub fn new(config: &ProxyConfig) -> Self {
        // Idle connections are never kept, so each request dials fresh.
        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(HttpConnector::new());

        Self {
            client,
            pipeline: Arc::new(TransformPipeline::from_config(&config.transform)),
            tunnel: config.tunnel.clone(),
            tunnels: TunnelTracker::new(),
        }
    }
}

/// The forward proxy server.
pub struct ProxyServer {
    router: Router,
    tunnels: TunnelTracker,
}

impl ProxyServer {
    /// Create a new server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let state = ProxyState::new(&config);
        let tunnels = state.tunnels.clone();
        let chain = MiddlewareChain::from_config(&config);

        tracing::debug!(middleware = ?chain.kinds(), "Middleware chain built");

        let router = chain.wrap(Router::new().fallback(dispatch).with_state(state));
        Self { router, tunnels }
    }

    /// Serve connections from `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Proxy listening");

        let mut builder = auto::Builder::new(TokioExecutor::new());
        builder.http1().auto_date_header(false);
        let graceful = GracefulShutdown::new();

        loop {
            let (stream, peer) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                        continue;
                    }
                },
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
            };

            let router = self.router.clone();
            let service = hyper::service::service_fn(move |mut request: Request<Incoming>| {
                request.extensions_mut().insert(ConnectInfo(peer));
                router.clone().oneshot(request)
            });

            let connection = builder
                .serve_connection_with_upgrades(TokioIo::new(stream), service)
                .into_owned();
            let connection = graceful.watch(connection);
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::debug!(peer = %peer, error = %e, "Connection closed with error");
                }
            });
        }

        drop(listener);
        graceful.shutdown().await;

        tracing::info!(open_tunnels = self.tunnels.active_count(), "Proxy stopped");
        Ok(())
    }
}
