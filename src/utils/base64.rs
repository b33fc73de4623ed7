//! Base64 helpers tuned for subscription payloads.
//!
//! Subscription-world convention: producers use either standard base64
//! with padding or URL-safe base64 without padding, so decoders must try
//! both alphabets in that order.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;

pub fn encode(input: &str) -> String {
    STANDARD.encode(input)
}

/// Decode with the standard alphabet first, then URL-safe without padding.
pub fn decode_any(input: &str) -> Option<Vec<u8>> {
    STANDARD
        .decode(input)
        .or_else(|_| URL_SAFE_NO_PAD.decode(input))
        .ok()
}

/// [`decode_any`] constrained to valid UTF-8.
pub fn decode_any_str(input: &str) -> Option<String> {
    decode_any(input).and_then(|bytes| String::from_utf8(bytes).ok())
}

/// Top-level unwrap of a possibly base64-wrapped document. Attempted
/// exactly once per subscription; the decode is only adopted when it
/// yields printable text, otherwise the original buffer is kept.
pub fn unwrap_document(content: &str) -> String {
    let trimmed = content.trim();
    if let Some(decoded) = decode_any_str(trimmed) {
        if looks_textual(&decoded) {
            return decoded;
        }
    }
    content.to_string()
}

/// Text check: everything printable or common whitespace.
fn looks_textual(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_any_standard_with_padding() {
        assert_eq!(decode_any_str("YWVzLTI1Ni1nY206dGVzdA==").unwrap(), "aes-256-gcm:test");
    }

    #[test]
    fn test_decode_any_urlsafe_without_padding() {
        // '-' and '_' only exist in the URL-safe alphabet
        assert_eq!(decode_any("PDw_Pz8-Pg").unwrap(), b"<<???>>");
    }

    #[test]
    fn test_decode_any_rejects_garbage() {
        assert!(decode_any("not base64 at all!").is_none());
    }

    #[test]
    fn test_unwrap_document_passes_plain_text_through() {
        let doc = "ss://abc\ntrojan://def";
        assert_eq!(unwrap_document(doc), doc);
    }

    #[test]
    fn test_unwrap_document_decodes_wrapped_lines() {
        let plain = "ss://abc\nss://def\n";
        let wrapped = encode(plain);
        assert_eq!(unwrap_document(&wrapped), plain);
    }

    #[test]
    fn test_unwrap_document_keeps_binary_looking_payloads() {
        // Valid base64 whose decoded bytes are not text
        let wrapped = STANDARD.encode([0u8, 159, 146, 150]);
        assert_eq!(unwrap_document(&wrapped), wrapped);
    }
}
