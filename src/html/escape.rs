//! Escaping for re-serialized HTML.

/// Escape text content: `&`, `'`, `<`, `>` and `"` become references.
pub fn escape_text(input: &str, out: &mut Vec<u8>) {
    for &b in input.as_bytes() {
        match b {
            b'&' => out.extend_from_slice(b"&amp;"),
            b'\'' => out.extend_from_slice(b"&#39;"),
            b'<' => out.extend_from_slice(b"&lt;"),
            b'>' => out.extend_from_slice(b"&gt;"),
            b'"' => out.extend_from_slice(b"&#34;"),
            _ => out.push(b),
        }
    }
}

/// Escape an attribute value with backslashes: `\` → `\\`, then `"` → `\"`.
pub fn escape_attribute(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
