use crate::registry::LoaderRegistry;
use docchat_core::{DocumentContext, LoadError};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024; // 50MB

/// Reads a file from disk and extracts its text through the registry.
#[derive(Clone)]
pub struct DocumentLoader {
    registry: Arc<LoaderRegistry>,
    max_file_size: u64,
}

impl DocumentLoader {
    pub fn new(registry: LoaderRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Override the largest file (in bytes) the loader will read.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Load `path` into a fresh [`DocumentContext`].
    ///
    /// Existence is checked before the extension, so a missing `.xyz` file is
    /// reported as [`LoadError::FileNotFound`].
    pub async fn load(&self, path: &Path) -> Result<DocumentContext, LoadError> {
        let not_found = || LoadError::FileNotFound {
            path: path.to_path_buf(),
        };

        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(not_found()),
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot stat document");
                return Err(not_found());
            }
        };

        let (extension, parser) = self.registry.resolve(path)?;
        let format = parser.format();

        if metadata.len() > self.max_file_size {
            return Err(LoadError::parse(
                format,
                format!(
                    "file is {} bytes, limit is {} bytes",
                    metadata.len(),
                    self.max_file_size
                ),
            ));
        }

        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => not_found(),
            _ => LoadError::parse(format, e),
        })?;

        let content = tokio::task::spawn_blocking(move || parser.parse(&bytes))
            .await
            .map_err(|e| LoadError::parse(format, format!("parser aborted: {e}")))??;

        info!(
            path = %path.display(),
            extension = %extension,
            format = %format,
            chars = content.chars().count(),
            "Document loaded"
        );

        Ok(DocumentContext::new(content, path, format))
    }
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new(LoaderRegistry::with_defaults())
    }
}
