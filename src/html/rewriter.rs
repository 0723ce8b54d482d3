//! Token-level HTML pretty-printer.

use std::io::{Read, Write};

use crate::html::escape::{escape_attribute, escape_text};
use crate::html::tokenizer::{Tag, Token, Tokens};
use crate::html::HtmlError;

/// Re-serializes tokens as indented HTML, one node per line.
///
/// Indentation is one space per open element. The body of a `script` element
/// is copied verbatim. Comments are dropped.
#[derive(Debug, Default)]
pub struct HtmlRewriter {
    depth: usize,
    raw: bool,
}

impl HtmlRewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current nesting depth. Zero again after a well-formed document.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Append the serialization of `token` to `out`.
    pub fn write_token(&mut self, token: &Token, out: &mut Vec<u8>) {
        match token {
            Token::StartTag(tag) => {
                self.indent(out);
                write_tag(tag, out);
                out.extend_from_slice(b">\n");
                self.depth += 1;
                self.raw = tag.name == "script";
            }
            Token::EndTag(name) => {
                out.extend_from_slice(b"</");
                out.extend_from_slice(name.as_bytes());
                out.extend_from_slice(b">\n");
                self.depth = self.depth.saturating_sub(1);
                self.raw = false;
            }
            Token::SelfClosingTag(tag) => {
                self.indent(out);
                write_tag(tag, out);
                out.extend_from_slice(b"/>\n");
            }
            Token::Text(text) if self.raw => out.extend_from_slice(text.as_bytes()),
            Token::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return;
                }
                self.indent(out);
                escape_text(text, out);
                out.push(b'\n');
            }
            Token::Doctype(content) => {
                out.extend_from_slice(b"<!");
                out.extend_from_slice(content.as_bytes());
                out.extend_from_slice(b">\n");
            }
            Token::Comment(_) => {}
        }
    }

    fn indent(&self, out: &mut Vec<u8>) {
        out.resize(out.len() + self.depth, b' ');
    }
}

fn write_tag(tag: &Tag, out: &mut Vec<u8>) {
    out.push(b'<');
    out.extend_from_slice(tag.name.as_bytes());
    for attribute in &tag.attributes {
        out.push(b' ');
        out.extend_from_slice(attribute.key.as_bytes());
        if !attribute.value.is_empty() {
            out.extend_from_slice(b"=\"");
            out.extend_from_slice(escape_attribute(&attribute.value).as_bytes());
            out.push(b'"');
        }
    }
}

/// Pretty-print all of `input` into `output`.
///
/// Tokens are written as they are produced, so on error `output` holds the
/// rewrite of everything before the failing token.
pub fn rewrite<R: Read, W: Write>(input: R, mut output: W) -> Result<(), HtmlError> {
    let mut rewriter = HtmlRewriter::new();
    let mut buf = Vec::new();
    for token in Tokens::new(input) {
        rewriter.write_token(&token?, &mut buf);
        output.write_all(&buf)?;
        buf.clear();
    }
    output.flush()?;
    Ok(())
}
