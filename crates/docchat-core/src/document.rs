use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The closed set of formats the loader can extract text from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    /// Plain UTF-8 text.
    Text,
    /// Portable Document Format.
    Pdf,
    /// Comma-separated values.
    Csv,
    /// Office Open XML spreadsheet.
    Xlsx,
    /// Office Open XML word-processing document.
    Docx,
    /// Call-detail records stored as JSON.
    CdrJson,
    /// Office Open XML presentation.
    Pptx,
}

impl DocumentFormat {
    /// Human-readable name used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            DocumentFormat::Text => "text",
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Csv => "CSV",
            DocumentFormat::Xlsx => "XLSX",
            DocumentFormat::Docx => "DOCX",
            DocumentFormat::CdrJson => "CDR JSON",
            DocumentFormat::Pptx => "PPTX",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Text extracted from the most recently loaded document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentContext {
    /// Extracted plain text, injected verbatim into prompts.
    pub content: String,
    /// Where the text was read from.
    pub source_path: PathBuf,
    /// Which parser produced the text.
    pub format: DocumentFormat,
    /// UTC timestamp of the load.
    pub loaded_at: DateTime<Utc>,
}

impl DocumentContext {
    /// Creates a context stamped with the current time.
    pub fn new(
        content: impl Into<String>,
        source_path: impl Into<PathBuf>,
        format: DocumentFormat,
    ) -> Self {
        Self {
            content: content.into(),
            source_path: source_path.into(),
            format,
            loaded_at: Utc::now(),
        }
    }

    /// Number of characters in the extracted text.
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}
