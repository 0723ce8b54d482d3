//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! client connection
//!     → server.rs (axum serve, upgrades enabled)
//!     → middleware/ (logging, proxy authentication)
//!     → dispatch.rs (route by method)
//!     → tunnel.rs (CONNECT)  |  forward.rs (everything else)
//!     → response.rs + transform pipeline
//!     → client
//! ```

pub mod dispatch;
pub mod error;
pub mod forward;
pub mod middleware;
pub mod response;
pub mod server;
pub mod tunnel;

pub use error::ProxyError;
pub use server::{ProxyServer, ProxyState};
