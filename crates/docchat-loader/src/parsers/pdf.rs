use crate::registry::DocumentParser;
use docchat_core::{DocumentFormat, LoadError};

/// PDF text extraction via `pdf-extract`; pages are concatenated in order.
pub struct PdfParser;

impl DocumentParser for PdfParser {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn parse(&self, bytes: &[u8]) -> Result<String, LoadError> {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| LoadError::parse(DocumentFormat::Pdf, e))
    }
}
