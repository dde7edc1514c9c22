//! String repair.
//!
//! Brings string data into the canonical encoding so corrupted byte
//! sequences cannot break downstream serialization.

use crate::value::Text;
use encoding_rs::Encoding;
use tracing::trace;

/// The encoding every repaired string ends up in.
pub static CANONICAL_ENCODING: &Encoding = &encoding_rs::UTF_8_INIT;

/// Repair a string value.
///
/// - canonical text is returned as-is;
/// - bytes declared canonical are kept when well-formed, otherwise decoded
///   with invalid sequences replaced by U+FFFD;
/// - bytes declared in another encoding are transcoded, replacing invalid
///   sequences;
/// - bytes without encoding metadata are returned unchanged.
pub fn repair(text: Text) -> Text {
    match text {
        Text::Utf8(_) | Text::Raw(_) => text,
        Text::Encoded { bytes, encoding } if encoding == CANONICAL_ENCODING => {
            match String::from_utf8(bytes) {
                Ok(s) => Text::Utf8(s),
                Err(err) => {
                    trace!(valid_up_to = err.utf8_error().valid_up_to(), "replacing malformed utf-8");
                    let (decoded, _) = CANONICAL_ENCODING.decode_without_bom_handling(err.as_bytes());
                    Text::Utf8(decoded.into_owned())
                }
            }
        }
        Text::Encoded { bytes, encoding } => {
            let (decoded, had_errors) = encoding.decode_without_bom_handling(&bytes);
            if had_errors {
                trace!(encoding = encoding.name(), "replacing malformed input while transcoding");
            }
            Text::Utf8(decoded.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_text_untouched() {
        assert_eq!(repair(Text::from("héllo")), Text::from("héllo"));
    }

    #[test]
    fn test_valid_declared_utf8_becomes_canonical() {
        let text = Text::encoded("héllo".as_bytes(), encoding_rs::UTF_8);
        assert_eq!(repair(text), Text::from("héllo"));
    }

    #[test]
    fn test_malformed_utf8_is_replaced() {
        let text = Text::encoded(vec![b'a', 0xff, 0xfe, b'b'], encoding_rs::UTF_8);
        let repaired = repair(text);
        let s = repaired.as_str().expect("canonical after repair");
        assert!(s.starts_with('a'));
        assert!(s.ends_with('b'));
        assert!(s.contains('\u{FFFD}'));
    }

    #[test]
    fn test_truncated_multibyte_is_replaced() {
        // First two bytes of a three-byte sequence.
        let text = Text::encoded(vec![0xe2, 0x82], encoding_rs::UTF_8);
        assert_eq!(repair(text), Text::from("\u{FFFD}"));
    }

    #[test]
    fn test_other_encoding_is_transcoded() {
        let text = Text::encoded(vec![b'c', b'a', b'f', 0xe9], encoding_rs::WINDOWS_1252);
        assert_eq!(repair(text), Text::from("café"));
    }

    #[test]
    fn test_utf16_is_transcoded() {
        let text = Text::encoded(vec![b'h', 0, b'i', 0], encoding_rs::UTF_16LE);
        assert_eq!(repair(text), Text::from("hi"));
    }

    #[test]
    fn test_invalid_shift_jis_is_replaced() {
        let text = Text::encoded(vec![b'x', 0x81], encoding_rs::SHIFT_JIS);
        let repaired = repair(text);
        assert_eq!(repaired.as_str(), Some("x\u{FFFD}"));
    }

    #[test]
    fn test_raw_bytes_untouched() {
        let raw = Text::raw(vec![0xff, 0x00, 0x41]);
        assert_eq!(repair(raw.clone()), raw);
    }
}
