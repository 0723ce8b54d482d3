//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration for the forward proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Middleware wrapping the dispatcher, outermost first.
    pub middleware: Vec<MiddlewareKind>,

    /// Proxy authentication settings.
    pub auth: AuthConfig,

    /// Response body transformation settings.
    pub transform: TransformConfig,

    /// CONNECT tunnel settings.
    pub tunnel: TunnelConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            middleware: vec![MiddlewareKind::Logging],
            auth: AuthConfig::default(),
            transform: TransformConfig::default(),
            tunnel: TunnelConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// A middleware that can be placed in front of the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MiddlewareKind {
    /// Start/end records with elapsed time.
    Logging,
    /// `Proxy-Authorization: Basic` check against [`AuthConfig::users`].
    Authentication,
}

/// Proxy authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Realm announced in the `Proxy-Authenticate` challenge.
    pub realm: String,

    /// Username to plaintext password.
    pub users: BTreeMap<String, String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            realm: "Shorty Mobile Proxy".to_string(),
            users: BTreeMap::new(),
        }
    }
}

/// Response body transformation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Smallest declared Content-Length worth compressing.
    pub gzip_min_length: u64,

    /// Media types that are already compressed and never gzipped.
    pub compressed_mime_types: Vec<String>,

    /// Pretty-print `text/html` responses.
    pub rewrite_html: bool,

    /// Largest single HTML token the tokenizer will buffer.
    pub max_html_token_bytes: usize,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            gzip_min_length: 1024,
            compressed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "video/mp4".to_string(),
            ],
            rewrite_html: true,
            max_html_token_bytes: 1024 * 1024,
        }
    }
}

/// CONNECT tunnel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TunnelConfig {
    /// Buffer size for each relay direction.
    pub relay_buffer_bytes: usize,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            relay_buffer_bytes: 8 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
