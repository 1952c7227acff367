//! Plain text files.

use super::{BoxError, TextExtractor};

/// Decodes the file as UTF-8 text, verbatim.
///
/// Invalid sequences are replaced with U+FFFD rather than rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, BoxError> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbatim() {
        let text = "line one\n  line two\t\r\n";
        assert_eq!(PlainTextExtractor.extract(text.as_bytes()).unwrap(), text);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let out = PlainTextExtractor.extract(b"ok \xff end").unwrap();
        assert_eq!(out, "ok \u{FFFD} end");
    }

    #[test]
    fn test_empty() {
        assert_eq!(PlainTextExtractor.extract(b"").unwrap(), "");
    }
}
