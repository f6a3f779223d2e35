//! Output encodings for relayed text.
//!
//! [`escape_html`] prepares a chunk for an HTML sink; [`escape_json`] prepares
//! text for embedding inside a one-line JSON string literal.

use std::fmt::Write as _;

/// Escape text for an HTML sink.
///
/// Line terminators become `<br/>` and the `<think>` / `</think>` pseudo-tags
/// emitted by reasoning models are entity-escaped so they render as text.
/// Other markup is passed through unchanged.
#[must_use]
pub fn escape_html(input: &str) -> String {
    input
        .replace("\r\n", "<br/>")
        .replace(['\n', '\r'], "<br/>")
        .replace("<think>", "&lt;think&gt;")
        .replace("</think>", "&lt;/think&gt;")
}

/// Escape text for a JSON string literal.
///
/// Backslash, double quote, newline, carriage return and tab use their short
/// escapes; any other control character is written as `\u00XX`.
#[must_use]
pub fn escape_json(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if u32::from(c) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out
}
