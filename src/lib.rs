//! Forward HTTP proxy with CONNECT tunneling and response transformation.

pub mod config;
pub mod html;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;
pub mod transform;

pub use config::schema::ProxyConfig;
pub use http::ProxyServer;
pub use lifecycle::Shutdown;
