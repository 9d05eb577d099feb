//! Escaping for text that ends up inside generated HTML fragments.
//!
//! Anchor display text passes through the Markdown converter a second time,
//! so it needs Markdown metacharacters backslash-escaped BEFORE the HTML
//! escape; attribute values sit inside a raw HTML tag and only need the HTML
//! escape.

/// Characters the Markdown converter would reinterpret inside link text.
const MARKDOWN_METACHARS: &[char] = &[
    '\\', '`', '*', '_', '{', '}', '[', ']', '(', ')', '#', '+', '.', '!', '-',
];

/// Backslash-escapes Markdown metacharacters so the converter reads them as
/// literal text.
pub fn escape_markdown_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if MARKDOWN_METACHARS.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Escapes text destined for anchor bodies: Markdown metacharacters first,
/// then HTML entities.
pub fn anchor_text(text: &str) -> String {
    html_escape::encode_text(&escape_markdown_chars(text)).into_owned()
}

/// Escapes a value for a double-quoted HTML attribute.
pub fn attr(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value).into_owned()
}
