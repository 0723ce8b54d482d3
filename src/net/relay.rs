//! Bidirectional byte relay between two duplex streams.
//!
//! # Responsibilities
//! - Copy A → B and B → A concurrently through bounded buffers
//! - Propagate end-of-stream as a write shutdown on the opposite side
//! - Join both directions before returning
//!
//! # Design Decisions
//! - A finished or failed direction never cancels the other one
//! - No content inspection; tunnels stay opaque
//! - No timeouts: a silent peer keeps its direction open

use std::io;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Outcome of both copy directions of a relay.
#[derive(Debug)]
pub struct RelayReport {
    /// Bytes copied from A to B, or the error that ended that direction.
    pub a_to_b: io::Result<u64>,
    /// Bytes copied from B to A, or the error that ended that direction.
    pub b_to_a: io::Result<u64>,
}

impl RelayReport {
    /// Bytes copied A → B, zero if the direction failed.
    pub fn a_to_b_bytes(&self) -> u64 {
        *self.a_to_b.as_ref().unwrap_or(&0)
    }

    /// Bytes copied B → A, zero if the direction failed.
    pub fn b_to_a_bytes(&self) -> u64 {
        *self.b_to_a.as_ref().unwrap_or(&0)
    }
}

/// Relay bytes between `a` and `b` until both directions have ended.
///
/// Each direction reads through its own buffer of `buffer_size` bytes. When a
/// direction sees end-of-stream its destination is shut down for writing so
/// the peer observes the half-close; the other direction keeps running.
pub async fn relay<A, B>(a: A, b: B, buffer_size: usize) -> RelayReport
where
    A: AsyncRead + AsyncWrite,
    B: AsyncRead + AsyncWrite,
{
    let (a_read, mut a_write) = tokio::io::split(a);
    let (b_read, mut b_write) = tokio::io::split(b);

    let a_to_b = copy_half(a_read, &mut b_write, buffer_size);
    let b_to_a = copy_half(b_read, &mut a_write, buffer_size);
    let (a_to_b, b_to_a) = tokio::join!(a_to_b, b_to_a);

    RelayReport { a_to_b, b_to_a }
}

async fn copy_half<R, W>(reader: R, writer: &mut W, buffer_size: usize) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::with_capacity(buffer_size, reader);
    let copied = tokio::io::copy_buf(&mut reader, writer).await;
    // Half-close: the peer may still be sending in the other direction.
    let _ = writer.shutdown().await;
    copied
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt};

    #[tokio::test]
    async fn test_relays_both_directions() {
        let (mut client, client_end) = duplex(64);
        let (mut target, target_end) = duplex(64);
        let handle = tokio::spawn(relay(client_end, target_end, 16));

        client.write_all(b"hello").await.unwrap();
        let mut buf = [0u8; 5];
        target.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");

        target.write_all(b"world").await.unwrap();
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"world");

        client.shutdown().await.unwrap();
        target.shutdown().await.unwrap();

        let report = handle.await.unwrap();
        assert_eq!(report.a_to_b_bytes(), 5);
        assert_eq!(report.b_to_a_bytes(), 5);
    }

    #[tokio::test]
    async fn test_half_close_keeps_other_direction_open() {
        let (mut client, client_end) = duplex(64);
        let (mut target, target_end) = duplex(64);
        let handle = tokio::spawn(relay(client_end, target_end, 16));

        client.write_all(b"request").await.unwrap();
        client.shutdown().await.unwrap();

        // Target sees the request followed by end-of-stream.
        let mut received = Vec::new();
        target.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"request");

        // The reverse direction still works after the half-close.
        target.write_all(b"late response").await.unwrap();
        target.shutdown().await.unwrap();

        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        assert_eq!(response, b"late response");

        let report = handle.await.unwrap();
        assert_eq!(report.a_to_b_bytes(), 7);
        assert_eq!(report.b_to_a_bytes(), 13);
    }

    #[tokio::test]
    async fn test_large_payload_is_unmodified_and_ordered() {
        let (mut client, client_end) = duplex(1024);
        let (mut target, target_end) = duplex(1024);
        let handle = tokio::spawn(relay(client_end, target_end, 128));

        let payload: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
        let expected = payload.clone();
        let writer = tokio::spawn(async move {
            client.write_all(&payload).await.unwrap();
            client.write_all(&[]).await.unwrap();
            client.shutdown().await.unwrap();
            client
        });

        let mut received = Vec::new();
        target.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, expected);

        target.shutdown().await.unwrap();
        let mut client = writer.await.unwrap();
        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());

        let report = handle.await.unwrap();
        assert_eq!(report.a_to_b_bytes(), expected.len() as u64);
        assert_eq!(report.b_to_a_bytes(), 0);
    }
}
