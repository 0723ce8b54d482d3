//! Mobile forward proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     client ──▶ middleware chain ──▶ dispatcher ──┬──▶ CONNECT tunnel ──▶ relay ◀──▶ target
//!                (logging, auth)                   │
//!                                                  └──▶ forwarder ──▶ origin
//!                                                          │
//!     client ◀── transform pipeline ◀──────────────────────┘
//!                (gzip, gunzip, HTML pretty-print)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use mobile_proxy::config::resolve_config;
use mobile_proxy::lifecycle::{spawn_signal_handler, Shutdown};
use mobile_proxy::observability::logging;
use mobile_proxy::ProxyServer;

#[derive(Parser)]
#[command(name = "mobile-proxy")]
#[command(about = "Forward HTTP proxy with CONNECT tunneling and response transformation", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding the config file.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = resolve_config(cli.config.as_deref(), cli.bind)?;

    logging::init(&config.observability);
    tracing::info!("mobile-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        middleware = ?config.middleware,
        users = config.auth.users.len(),
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    spawn_signal_handler(shutdown);

    ProxyServer::new(config).run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
