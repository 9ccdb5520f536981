use crate::registry::DocumentParser;
use docchat_core::{DocumentFormat, LoadError};

/// UTF-8 plain text. A leading byte-order mark is dropped.
pub struct TextParser;

impl DocumentParser for TextParser {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Text
    }

    fn parse(&self, bytes: &[u8]) -> Result<String, LoadError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        String::from_utf8(bytes.to_vec())
            .map_err(|e| LoadError::parse(DocumentFormat::Text, format!("invalid UTF-8: {e}")))
    }
}
