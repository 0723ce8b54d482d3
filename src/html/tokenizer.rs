//! Incremental HTML tokenizer.
//!
//! # Responsibilities
//! - Split a byte stream into start/end/self-closing tags, text, comments and doctypes
//! - Accept input in arbitrary chunks; tokens never depend on chunk boundaries
//! - Switch script-like elements to raw text the way a browser would
//!
//! # Design Decisions
//! - Lexing is done by the `html5ever` tokenizer; this module only drives it and
//!   flattens its tokens into an owned, pull-based sequence
//! - Adjacent character runs are merged into one text token
//! - Input that goes a whole token limit without completing a token is an error,
//!   not unbounded buffering
//! - Markup left unterminated at end of input is dropped, like a clean EOF

use std::collections::VecDeque;
use std::io::{self, Read};

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    self as lexer, BufferQueue, TagKind, TokenSink, TokenSinkResult, TokenizerOpts,
};

use crate::html::HtmlError;

/// Default upper bound for a single buffered token.
pub const DEFAULT_MAX_TOKEN_BYTES: usize = 1024 * 1024;

/// A tag attribute. Keys are lowercased, values have references decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

/// A start or self-closing tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub attributes: Vec<Attribute>,
}

/// One lexical unit of an HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartTag(Tag),
    EndTag(String),
    SelfClosingTag(Tag),
    /// Text content. Decoded, except inside raw text elements.
    Text(String),
    Comment(String),
    /// The declaration after the `DOCTYPE` keyword, e.g. `html`.
    Doctype(String),
}

/// Result of asking the tokenizer for its next token.
#[derive(Debug, PartialEq, Eq)]
pub enum Next {
    Token(Token),
    /// More input must be fed (or `finish` called) before progress is possible.
    NeedInput,
    /// The input has been fully consumed. Every later call returns this again.
    EndOfInput,
}

/// Receives tokens from the lexer and queues them in our shape.
#[derive(Default)]
struct Collector {
    tokens: VecDeque<Token>,
    /// Non-text tokens queued since the counter was last reset.
    completed: usize,
}

impl Collector {
    fn push(&mut self, token: Token) {
        self.completed += 1;
        self.tokens.push_back(token);
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.tokens.back_mut() {
            Some(Token::Text(pending)) => pending.push_str(text),
            _ => self.tokens.push_back(Token::Text(text.to_string())),
        }
    }

    fn push_tag(&mut self, tag: lexer::Tag) -> TokenSinkResult<()> {
        let name = tag.name.to_string();
        if let TagKind::EndTag = tag.kind {
            self.push(Token::EndTag(name));
            return TokenSinkResult::Continue;
        }

        let attributes = tag
            .attrs
            .iter()
            .map(|attribute| Attribute {
                key: attribute.name.local.to_string(),
                value: attribute.value.to_string(),
            })
            .collect();
        let element = Tag { name, attributes };

        if tag.self_closing {
            self.push(Token::SelfClosingTag(element));
            return TokenSinkResult::Continue;
        }
        let mode = content_mode(&element.name);
        self.push(Token::StartTag(element));
        mode
    }
}

impl TokenSink for Collector {
    type Handle = ();

    fn process_token(&mut self, token: lexer::Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            lexer::Token::TagToken(tag) => return self.push_tag(tag),
            lexer::Token::CharacterTokens(text) => self.push_text(&text),
            lexer::Token::NullCharacterToken => self.push_text("\u{fffd}"),
            lexer::Token::CommentToken(text) => self.push(Token::Comment(text.to_string())),
            lexer::Token::DoctypeToken(doctype) => {
                self.push(Token::Doctype(doctype_content(&doctype)))
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

/// How the lexer must read the content of a just-opened element.
fn content_mode(name: &str) -> TokenSinkResult<()> {
    match name {
        "script" => TokenSinkResult::RawData(RawKind::ScriptData),
        "style" | "iframe" | "noembed" | "noframes" | "noscript" | "xmp" => {
            TokenSinkResult::RawData(RawKind::Rawtext)
        }
        "textarea" | "title" => TokenSinkResult::RawData(RawKind::Rcdata),
        "plaintext" => TokenSinkResult::Plaintext,
        _ => TokenSinkResult::Continue,
    }
}

/// Rebuild the declaration that followed `<!DOCTYPE`.
fn doctype_content(doctype: &lexer::Doctype) -> String {
    let mut content = doctype.name.as_deref().unwrap_or_default().to_string();
    match (&doctype.public_id, &doctype.system_id) {
        (Some(public), system) => {
            push_quoted(&mut content, " PUBLIC ", public);
            if let Some(system) = system {
                push_quoted(&mut content, " ", system);
            }
        }
        (None, Some(system)) => push_quoted(&mut content, " SYSTEM ", system),
        (None, None) => {}
    }
    content
}

fn push_quoted(content: &mut String, prefix: &str, value: &str) {
    content.push_str(prefix);
    content.push('"');
    content.push_str(value);
    content.push('"');
}

/// Remove the decodable prefix of `bytes` and return it as text.
///
/// Invalid sequences become U+FFFD. An incomplete sequence at the end stays in
/// `bytes` for the next call.
fn take_utf8(bytes: &mut Vec<u8>) -> String {
    let mut text = String::new();
    let mut start = 0;
    while start < bytes.len() {
        match std::str::from_utf8(&bytes[start..]) {
            Ok(valid) => {
                text.push_str(valid);
                start = bytes.len();
            }
            Err(e) => {
                let valid_end = start + e.valid_up_to();
                text.push_str(&String::from_utf8_lossy(&bytes[start..valid_end]));
                match e.error_len() {
                    Some(len) => {
                        text.push('\u{fffd}');
                        start = valid_end + len;
                    }
                    None => {
                        start = valid_end;
                        break;
                    }
                }
            }
        }
    }
    bytes.drain(..start);
    text
}

/// Push-fed, pull-drained HTML tokenizer.
///
/// Feed bytes with [`Tokenizer::feed`], call [`Tokenizer::finish`] once the
/// input is exhausted, and drain tokens with [`Tokenizer::next_token`].
pub struct Tokenizer {
    lexer: lexer::Tokenizer<Collector>,
    input: BufferQueue,
    undecoded: Vec<u8>,
    /// Bytes fed since the lexer last completed a non-text token.
    stalled_bytes: usize,
    max_token_bytes: usize,
    error: Option<HtmlError>,
    eof: bool,
    done: bool,
}

impl Tokenizer {
    /// Create a tokenizer with the default token size limit.
    pub fn new() -> Self {
        Self::with_max_token_bytes(DEFAULT_MAX_TOKEN_BYTES)
    }

    /// Create a tokenizer that fails once `max_token_bytes` of input pass
    /// without a token completing.
    pub fn with_max_token_bytes(max_token_bytes: usize) -> Self {
        Self {
            lexer: lexer::Tokenizer::new(Collector::default(), TokenizerOpts::default()),
            input: BufferQueue::default(),
            undecoded: Vec::new(),
            stalled_bytes: 0,
            max_token_bytes: max_token_bytes.max(1),
            error: None,
            eof: false,
            done: false,
        }
    }

    /// Append input bytes.
    pub fn feed(&mut self, data: &[u8]) {
        // Slices bound how far a token can grow before the limit is checked.
        for slice in data.chunks(self.max_token_bytes) {
            if self.eof || self.error.is_some() {
                return;
            }
            self.undecoded.extend_from_slice(slice);
            let text = take_utf8(&mut self.undecoded);
            self.lex(&text);

            let collector = &mut self.lexer.sink;
            if collector.completed > 0 {
                collector.completed = 0;
                self.stalled_bytes = 0;
            } else {
                self.stalled_bytes += slice.len();
            }
            if self.stalled_bytes >= self.max_token_bytes {
                self.error = Some(HtmlError::TokenTooLarge {
                    limit: self.max_token_bytes,
                });
            }
        }
    }

    /// Mark the input as complete.
    pub fn finish(&mut self) {
        if self.eof {
            return;
        }
        self.eof = true;
        if self.error.is_some() {
            return;
        }
        if !self.undecoded.is_empty() {
            self.undecoded.clear();
            self.lex("\u{fffd}");
        }
        self.lexer.end();
    }

    fn lex(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.input.push_back(StrTendril::from_slice(text));
        let _ = self.lexer.feed(&mut self.input);
    }

    /// Produce the next token, or report that more input is needed.
    pub fn next_token(&mut self) -> Result<Next, HtmlError> {
        if self.done {
            return Ok(Next::EndOfInput);
        }

        let tokens = &mut self.lexer.sink.tokens;
        // A trailing text run may still grow with the next chunk.
        let still_growing = !self.eof
            && self.error.is_none()
            && tokens.len() == 1
            && matches!(tokens.front(), Some(Token::Text(_)));
        if !still_growing {
            if let Some(token) = tokens.pop_front() {
                return Ok(Next::Token(token));
            }
        }

        if let Some(error) = self.error.take() {
            self.done = true;
            return Err(error);
        }
        if self.eof {
            self.done = true;
            return Ok(Next::EndOfInput);
        }
        Ok(Next::NeedInput)
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy token sequence pulled from a blocking reader.
///
/// Ends after the input is exhausted or after the first error.
pub struct Tokens<R> {
    reader: R,
    tokenizer: Tokenizer,
    chunk: Vec<u8>,
    finished: bool,
}

impl<R: Read> Tokens<R> {
    /// Tokenize `reader` with default limits.
    pub fn new(reader: R) -> Self {
        Self::with_tokenizer(reader, Tokenizer::new())
    }

    /// Tokenize `reader` with a preconfigured tokenizer.
    pub fn with_tokenizer(reader: R, tokenizer: Tokenizer) -> Self {
        Self {
            reader,
            tokenizer,
            chunk: vec![0; 8 * 1024],
            finished: false,
        }
    }
}

impl<R: Read> Iterator for Tokens<R> {
    type Item = Result<Token, HtmlError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            match self.tokenizer.next_token() {
                Ok(Next::Token(token)) => return Some(Ok(token)),
                Ok(Next::EndOfInput) => {
                    self.finished = true;
                    return None;
                }
                Ok(Next::NeedInput) => match self.reader.read(&mut self.chunk) {
                    Ok(0) => self.tokenizer.finish(),
                    Ok(n) => self.tokenizer.feed(&self.chunk[..n]),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => {
                        self.finished = true;
                        return Some(Err(HtmlError::Io(e)));
                    }
                },
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &[u8]) -> Vec<Token> {
        Tokens::new(input).collect::<Result<_, _>>().unwrap()
    }

    fn tokenize_bytewise(input: &[u8]) -> Vec<Token> {
        let mut tokenizer = Tokenizer::new();
        let mut tokens = Vec::new();
        let mut input = input.iter();
        loop {
            match tokenizer.next_token().unwrap() {
                Next::Token(token) => tokens.push(token),
                Next::NeedInput => match input.next() {
                    Some(b) => tokenizer.feed(&[*b]),
                    None => tokenizer.finish(),
                },
                Next::EndOfInput => return tokens,
            }
        }
    }

    fn start(name: &str, attributes: &[(&str, &str)]) -> Token {
        Token::StartTag(Tag {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(key, value)| Attribute {
                    key: key.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        })
    }

    fn end(name: &str) -> Token {
        Token::EndTag(name.to_string())
    }

    fn text(s: &str) -> Token {
        Token::Text(s.to_string())
    }

    #[test]
    fn test_basic_document() {
        let tokens = tokenize(b"<!DOCTYPE html><P Class=\"a\">Hi &amp; bye</p><br/><!-- c -->");
        assert_eq!(
            tokens,
            vec![
                Token::Doctype("html".to_string()),
                start("p", &[("class", "a")]),
                text("Hi & bye"),
                end("p"),
                Token::SelfClosingTag(Tag {
                    name: "br".into(),
                    attributes: vec![],
                }),
                Token::Comment(" c ".to_string()),
            ]
        );
    }

    #[test]
    fn test_doctype_keeps_identifiers() {
        let tokens = tokenize(
            b"<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\">",
        );
        assert_eq!(
            tokens,
            vec![Token::Doctype(
                "html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\""
                    .to_string()
            )]
        );
    }

    #[test]
    fn test_named_references_are_decoded() {
        let tokens = tokenize("<p title=\"&eacute;t&eacute;\">caf&eacute; &hearts; &euro;5 &#x263A;</p>".as_bytes());
        assert_eq!(
            tokens,
            vec![
                start("p", &[("title", "été")]),
                text("café ♥ €5 ☺"),
                end("p"),
            ]
        );
    }

    #[test]
    fn test_attribute_forms() {
        let tokens = tokenize(b"<a href=foo.html data-x='say \"hi\"' title=\"a &lt; b\" disabled>");
        assert_eq!(
            tokens,
            vec![start(
                "a",
                &[
                    ("href", "foo.html"),
                    ("data-x", "say \"hi\""),
                    ("title", "a < b"),
                    ("disabled", ""),
                ]
            )]
        );
    }

    #[test]
    fn test_quoted_gt_does_not_end_tag() {
        let tokens = tokenize(b"<div data-rule=\"a > b\">x</div>");
        assert_eq!(
            tokens,
            vec![start("div", &[("data-rule", "a > b")]), text("x"), end("div")]
        );
    }

    #[test]
    fn test_script_body_is_raw() {
        let tokens = tokenize(b"<script>if (a<b && c) { s = \"</p>&amp;\"; }</SCRIPT><p>");
        assert_eq!(
            tokens,
            vec![
                start("script", &[]),
                text("if (a<b && c) { s = \"</p>&amp;\"; }"),
                end("script"),
                start("p", &[]),
            ]
        );
    }

    #[test]
    fn test_title_decodes_references() {
        let tokens = tokenize(b"<title>Q&amp;A <b></title>");
        assert_eq!(tokens, vec![start("title", &[]), text("Q&A <b>"), end("title")]);
    }

    #[test]
    fn test_stray_less_than_is_text() {
        let tokens = tokenize(b"<p>a < b</p>");
        assert_eq!(tokens, vec![start("p", &[]), text("a < b"), end("p")]);
    }

    #[test]
    fn test_unterminated_tag_at_eof_is_dropped() {
        let tokens = tokenize(b"<p>hi</p><div class=");
        assert_eq!(tokens, vec![start("p", &[]), text("hi"), end("p")]);
    }

    #[test]
    fn test_chunk_boundaries_do_not_change_tokens() {
        let input = "<!doctype html><html><head><style>p > a { color: red }</style>\
            <script type=\"text/javascript\">var x = '</div>';</script></head>\
            <body onload='go()'>  text &amp; more caf&eacute; ☕ <img src=\"a.png\"/>tail</body></html>\n";
        assert_eq!(tokenize_bytewise(input.as_bytes()), tokenize(input.as_bytes()));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let tokens = tokenize(b"<p>a\xffb</p>");
        assert_eq!(tokens, vec![start("p", &[]), text("a\u{fffd}b"), end("p")]);
    }

    #[test]
    fn test_token_too_large() {
        let mut tokenizer = Tokenizer::with_max_token_bytes(8);
        tokenizer.feed(b"<div class='aaaaaaaaaaaa");
        assert!(matches!(
            tokenizer.next_token(),
            Err(HtmlError::TokenTooLarge { limit: 8 })
        ));
        assert_eq!(tokenizer.next_token().unwrap(), Next::EndOfInput);
    }

    #[test]
    fn test_end_of_input_is_sticky() {
        let mut tokenizer = Tokenizer::new();
        tokenizer.feed(b"x");
        assert_eq!(tokenizer.next_token().unwrap(), Next::NeedInput);
        tokenizer.finish();
        assert_eq!(tokenizer.next_token().unwrap(), Next::Token(text("x")));
        assert_eq!(tokenizer.next_token().unwrap(), Next::EndOfInput);
        assert_eq!(tokenizer.next_token().unwrap(), Next::EndOfInput);
    }
}
