use crate::parsers::{
    CdrJsonParser, CsvParser, DocxParser, PdfParser, PptxParser, TextParser, XlsxParser,
};
use docchat_core::{DocumentFormat, LoadError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Extracts plain text from the raw bytes of one document format.
///
/// Parsers are synchronous; [`crate::DocumentLoader`] runs them on the
/// blocking pool.
pub trait DocumentParser: Send + Sync {
    /// The format this parser understands.
    fn format(&self) -> DocumentFormat;

    /// Extract the document text. Failures are always typed, never an empty
    /// string standing in for an error.
    fn parse(&self, bytes: &[u8]) -> Result<String, LoadError>;
}

/// Maps lowercase file extensions (without the leading dot) to parsers.
///
/// Compound extensions such as `cdr.json` are supported; the longest
/// registered suffix of the file name wins.
pub struct LoaderRegistry {
    parsers: HashMap<String, Arc<dyn DocumentParser>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Registry with every built-in parser.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("txt", Arc::new(TextParser));
        registry.register("pdf", Arc::new(PdfParser));
        registry.register("csv", Arc::new(CsvParser));
        registry.register("xlsx", Arc::new(XlsxParser));
        registry.register("docx", Arc::new(DocxParser));
        registry.register("pptx", Arc::new(PptxParser));
        let cdr: Arc<dyn DocumentParser> = Arc::new(CdrJsonParser);
        registry.register("cdr", cdr.clone());
        registry.register("cdr.json", cdr);
        registry
    }

    pub fn register(&mut self, extension: &str, parser: Arc<dyn DocumentParser>) {
        let extension = extension.trim_start_matches('.').to_lowercase();
        debug!(extension = %extension, format = %parser.format(), "Registered parser");
        self.parsers.insert(extension, parser);
    }

    /// Find the parser for `path`, returning the matched extension with it.
    pub fn resolve(&self, path: &Path) -> Result<(String, Arc<dyn DocumentParser>), LoadError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let best = self
            .parsers
            .iter()
            .filter(|(ext, _)| {
                file_name.len() > ext.len() + 1
                    && file_name.ends_with(ext.as_str())
                    && file_name[..file_name.len() - ext.len()].ends_with('.')
            })
            .max_by_key(|(ext, _)| ext.len());

        match best {
            Some((ext, parser)) => Ok((ext.clone(), parser.clone())),
            None => Err(LoadError::UnsupportedFormat {
                extension: path
                    .extension()
                    .map(|e| e.to_string_lossy().to_lowercase())
                    .unwrap_or_default(),
            }),
        }
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }

    pub fn parser_count(&self) -> usize {
        self.parsers.len()
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
