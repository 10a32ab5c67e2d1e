//! Utility functions shared across the crate.

use std::borrow::Cow;

/// Decode raw manuscript bytes to a string.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. Falls back to Windows-1252 (common in older LaTeX sources)
///
/// # Arguments
///
/// * `bytes` - The raw bytes to decode
///
/// # Returns
///
/// The decoded string. Uses `Cow<str>` to avoid allocation when the input
/// is valid UTF-8.
///
/// # Examples
///
/// ```
/// use preprint::util::decode_text;
///
/// let text = decode_text(b"\\section{Introduction}");
/// assert_eq!(text, "\\section{Introduction}");
///
/// // 0xE9 is 'é' in Windows-1252 but invalid UTF-8
/// let text = decode_text(b"Poincar\xE9");
/// assert_eq!(text, "Poincaré");
/// ```
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (text, _, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return text;
    }

    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        let text = decode_text("% résumé of §2".as_bytes());
        assert_eq!(text, "% résumé of §2");
    }

    #[test]
    fn test_decode_utf8_borrows() {
        let text = decode_text(b"\\documentclass{article}");
        assert!(matches!(text, Cow::Borrowed(_)));
    }

    #[test]
    fn test_decode_windows_1252_fallback() {
        // "café" encoded as CP1252
        let text = decode_text(b"caf\xE9");
        assert_eq!(text, "café");
    }

    #[test]
    fn test_decode_utf8_bom_stripped() {
        let text = decode_text(b"\xEF\xBB\xBF\\input{intro}");
        assert_eq!(text, "\\input{intro}");
    }
}
