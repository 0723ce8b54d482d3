//! Content transform pipeline for forwarded responses.
//!
//! # Responsibilities
//! - Pick a body strategy per response (see [`policy`])
//! - Fix up framing headers so `Content-Length` never coexists with chunked coding
//! - Stream gzip output, gunzipped input and rewritten HTML without buffering bodies
//!
//! # Design Decisions
//! - An invalid gzip header on an HTML body is caught before the status is sent
//! - Failures after the status is sent truncate the body and are only logged

pub mod policy;

use std::io;
use std::pin::Pin;

use async_compression::tokio::bufread::{GzipDecoder, GzipEncoder};
use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, Stream};
use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::io::{ReaderStream, StreamReader};

use crate::config::TransformConfig;
use crate::html::rewrite_stream;
use crate::http::ProxyError;

pub use policy::{BodyStrategy, CompressedMimeSet, CompressionPolicy};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Applies the body strategy chosen by a [`CompressionPolicy`].
#[derive(Debug, Clone)]
pub struct TransformPipeline {
    policy: CompressionPolicy,
    max_html_token_bytes: usize,
}

impl TransformPipeline {
    pub fn new(policy: CompressionPolicy, max_html_token_bytes: usize) -> Self {
        Self {
            policy,
            max_html_token_bytes,
        }
    }

    pub fn from_config(config: &TransformConfig) -> Self {
        Self::new(
            CompressionPolicy::from_config(config),
            config.max_html_token_bytes,
        )
    }

    /// Build the client response for an upstream response.
    ///
    /// `accepts_gzip` is the client's gzip acceptance, `target` is only used
    /// for diagnostics.
    pub async fn transform_and_write(
        &self,
        accepts_gzip: bool,
        status: StatusCode,
        mut headers: HeaderMap,
        body: Body,
        target: &str,
    ) -> Result<Response, ProxyError> {
        let strategy = self.policy.decide(accepts_gzip, &headers);
        tracing::debug!(url = %target, status = %status, ?strategy, "Transforming response");

        let body = match strategy {
            BodyStrategy::Compress => {
                headers.remove(header::CONTENT_LENGTH);
                headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
                headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
                Body::from_stream(gzip(body))
            }
            BodyStrategy::RewriteHtml { gunzip } => {
                headers.remove(header::CONTENT_LENGTH);
                headers.remove(header::CONTENT_ENCODING);
                headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
                let reader: Pin<Box<dyn AsyncRead + Send>> = if gunzip {
                    Box::pin(gunzip_checked(body).await.map_err(ProxyError::UpstreamEncoding)?)
                } else {
                    Box::pin(StreamReader::new(byte_stream(body)))
                };
                Body::from_stream(rewrite_stream(reader, self.max_html_token_bytes))
            }
            BodyStrategy::Passthrough => {
                if policy::is_chunked(&headers) {
                    headers.remove(header::CONTENT_LENGTH);
                }
                body
            }
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::from_config(&TransformConfig::default())
    }
}

fn byte_stream(body: Body) -> ByteStream {
    Box::pin(body.into_data_stream().map(|chunk| chunk.map_err(io::Error::other)))
}

fn gzip(body: Body) -> ReaderStream<GzipEncoder<StreamReader<ByteStream, Bytes>>> {
    ReaderStream::new(GzipEncoder::new(StreamReader::new(byte_stream(body))))
}

/// Wrap `body` in a gzip decoder after checking the gzip magic bytes.
async fn gunzip_checked(body: Body) -> io::Result<GzipDecoder<StreamReader<ByteStream, Bytes>>> {
    let mut upstream = byte_stream(body);
    let mut prefix = BytesMut::new();
    while prefix.len() < GZIP_MAGIC.len() {
        match upstream.next().await {
            Some(chunk) => prefix.extend_from_slice(&chunk?),
            None => break,
        }
    }
    if !prefix.starts_with(&GZIP_MAGIC) {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "invalid gzip header"));
    }

    let replayed: ByteStream = Box::pin(stream::iter([Ok(prefix.freeze())]).chain(upstream));
    Ok(GzipDecoder::new(StreamReader::new(replayed)))
}
