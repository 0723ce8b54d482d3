//! Streaming HTML pretty-printing.
//!
//! # Data Flow
//! ```text
//! upstream bytes
//!     → tokenizer.rs (html5ever lexer, bounded buffering)
//!     → rewriter.rs (indentation + escaping)
//!     → stream.rs (blocking worker, async chunks for the response body)
//! ```

pub mod escape;
pub mod rewriter;
pub mod stream;
pub mod tokenizer;

use std::io;

use thiserror::Error;

pub use rewriter::{rewrite, HtmlRewriter};
pub use stream::rewrite_stream;
pub use tokenizer::{Attribute, Next, Tag, Token, Tokenizer, Tokens};

/// Failure while tokenizing or rewriting HTML.
#[derive(Debug, Error)]
pub enum HtmlError {
    #[error("I/O error while reading HTML: {0}")]
    Io(#[from] io::Error),

    #[error("HTML token exceeds {limit} bytes")]
    TokenTooLarge { limit: usize },
}
