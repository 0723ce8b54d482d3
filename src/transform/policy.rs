//! Per-response body strategy selection.
//!
//! # Decision Order
//! 1. Already encoded (non-empty `Content-Encoding` or any `Transfer-Encoding`)
//!    responses are never re-encoded
//! 2. Large, compressible responses to gzip-capable clients are compressed
//! 3. `text/html` responses are pretty-printed, gunzipped first when needed
//! 4. Everything else passes through

use std::collections::HashSet;

use axum::http::{header, HeaderMap};

use crate::config::TransformConfig;

/// Media types that are already compressed.
#[derive(Debug, Clone)]
pub struct CompressedMimeSet {
    types: HashSet<String>,
}

impl CompressedMimeSet {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            types: types
                .into_iter()
                .map(|t| t.as_ref().trim().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Whether the media type of `content_type` is in the set. Parameters such
    /// as `charset` are ignored.
    pub fn contains(&self, content_type: &str) -> bool {
        self.types.contains(&media_type(content_type))
    }
}

impl Default for CompressedMimeSet {
    fn default() -> Self {
        Self::new(["image/jpeg", "image/png", "image/gif", "video/mp4"])
    }
}

/// How a response body is written to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyStrategy {
    Passthrough,
    Compress,
    RewriteHtml { gunzip: bool },
}

/// Chooses a [`BodyStrategy`] from response headers.
#[derive(Debug, Clone)]
pub struct CompressionPolicy {
    min_length: u64,
    compressed: CompressedMimeSet,
    rewrite_html: bool,
}

impl CompressionPolicy {
    pub fn new(min_length: u64, compressed: CompressedMimeSet, rewrite_html: bool) -> Self {
        Self {
            min_length,
            compressed,
            rewrite_html,
        }
    }

    pub fn from_config(config: &TransformConfig) -> Self {
        Self::new(
            config.gzip_min_length,
            CompressedMimeSet::new(&config.compressed_mime_types),
            config.rewrite_html,
        )
    }

    /// Pick the strategy for an upstream response.
    pub fn decide(&self, accepts_gzip: bool, headers: &HeaderMap) -> BodyStrategy {
        if accepts_gzip && !already_encoded(headers) && self.is_worth_gzipping(headers) {
            return BodyStrategy::Compress;
        }
        if self.rewrite_html && is_html(headers) {
            return BodyStrategy::RewriteHtml {
                gunzip: is_gzip_encoded(headers),
            };
        }
        BodyStrategy::Passthrough
    }

    /// Declared length meets the minimum and the content type is compressible.
    pub fn is_worth_gzipping(&self, headers: &HeaderMap) -> bool {
        let long_enough = declared_content_length(headers).is_some_and(|len| len >= self.min_length);
        let content_type = header_str(headers, header::CONTENT_TYPE);
        long_enough && !content_type.is_empty() && !self.compressed.contains(content_type)
    }
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self::from_config(&TransformConfig::default())
    }
}

/// Whether the client's `Accept-Encoding` mentions gzip.
pub fn client_accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains("gzip"))
}

/// Non-empty `Content-Encoding`, or any `Transfer-Encoding` at all.
pub fn already_encoded(headers: &HeaderMap) -> bool {
    !header_str(headers, header::CONTENT_ENCODING).is_empty()
        || headers.contains_key(header::TRANSFER_ENCODING)
}

/// The declared `Content-Length`, if present and numeric.
pub fn declared_content_length(headers: &HeaderMap) -> Option<u64> {
    header_str(headers, header::CONTENT_LENGTH).trim().parse().ok()
}

pub fn is_html(headers: &HeaderMap) -> bool {
    header_str(headers, header::CONTENT_TYPE).starts_with("text/html")
}

pub fn is_gzip_encoded(headers: &HeaderMap) -> bool {
    header_str(headers, header::CONTENT_ENCODING)
        .trim()
        .eq_ignore_ascii_case("gzip")
}

/// Whether the response declares chunked transfer coding.
pub fn is_chunked(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::TRANSFER_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.split(',').any(|coding| coding.trim().eq_ignore_ascii_case("chunked")))
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> &str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}
