//! Observability subsystem.
//!
//! # Design Decisions
//! - All subsystems emit `tracing` events with structured fields
//! - The subscriber is installed by the binary; the library only emits
//! - Log level comes from config, `RUST_LOG` overrides it

pub mod logging;
