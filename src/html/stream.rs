//! Async adapter turning an HTML byte reader into a stream of rewritten chunks.
//!
//! The lexer state is not `Send`, so tokenizing runs on the blocking pool and
//! rewritten chunks come back over a bounded channel.

use std::io::{self, Read};
use std::mem;

use bytes::Bytes;
use futures_util::stream::{self, Stream};
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::io::SyncIoBridge;

use crate::html::rewriter::HtmlRewriter;
use crate::html::tokenizer::{Next, Tokenizer};
use crate::html::HtmlError;

const READ_CHUNK_BYTES: usize = 8 * 1024;
const CHANNEL_DEPTH: usize = 8;

/// Stream the pretty-printed form of the HTML read from `reader`.
///
/// A tokenizer or read failure is logged and ends the stream after the output
/// produced so far; the stream itself never yields an error.
///
/// Must be called from within a Tokio runtime.
pub fn rewrite_stream<R>(
    reader: R,
    max_token_bytes: usize,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
    let reader = SyncIoBridge::new(reader);
    tokio::task::spawn_blocking(move || {
        if let Err(e) = pump(reader, max_token_bytes, &tx) {
            tracing::warn!(error = %e, "HTML rewrite failed, response body truncated");
        }
    });

    stream::unfold(rx, |mut rx| async move {
        let chunk = rx.recv().await?;
        Some((Ok(chunk), rx))
    })
}

/// Tokenize and rewrite `reader`, sending output each time the tokenizer runs
/// dry. Output produced before a failure is still sent.
fn pump<R: Read>(
    mut reader: R,
    max_token_bytes: usize,
    tx: &mpsc::Sender<Bytes>,
) -> Result<(), HtmlError> {
    let mut tokenizer = Tokenizer::with_max_token_bytes(max_token_bytes);
    let mut rewriter = HtmlRewriter::new();
    let mut chunk = vec![0; READ_CHUNK_BYTES];
    let mut out = Vec::new();

    let result = loop {
        match tokenizer.next_token() {
            Ok(Next::Token(token)) => rewriter.write_token(&token, &mut out),
            Ok(Next::EndOfInput) => break Ok(()),
            Ok(Next::NeedInput) => {
                if !out.is_empty() && tx.blocking_send(Bytes::from(mem::take(&mut out))).is_err() {
                    tracing::debug!("Client went away, HTML rewrite stopped");
                    return Ok(());
                }
                match reader.read(&mut chunk) {
                    Ok(0) => tokenizer.finish(),
                    Ok(n) => tokenizer.feed(&chunk[..n]),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => break Err(HtmlError::Io(e)),
                }
            }
            Err(e) => break Err(e),
        }
    };

    if !out.is_empty() {
        let _ = tx.blocking_send(Bytes::from(out));
    }
    result
}
