//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! CONNECT accepted by the tunnel handler
//!     → upstream TcpStream dialed
//!     → client connection upgraded to raw bytes
//!     → relay.rs (bidirectional copy, joined)
//!     → both ends dropped
//! ```
//!
//! # Design Decisions
//! - Relay is generic over any duplex stream so it can be tested in memory
//! - Tunnel IDs tag every tunnel in the logs

pub mod connection;
pub mod relay;

pub use connection::{TunnelGuard, TunnelId, TunnelTracker};
pub use relay::{relay, RelayReport};
