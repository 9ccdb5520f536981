//! Core types and error definitions for docchat.
//!
//! This crate provides the foundational types shared across all docchat crates,
//! including the error kinds of every subsystem, conversation turns, and the
//! loaded-document context.
//!
//! # Main types
//!
//! - [`DocchatError`]: Unified error enum for all docchat subsystems.
//! - [`DocchatResult`]: Convenience alias for `Result<T, DocchatError>`.
//! - [`LoadError`]: Why a document could not become the active context.
//! - [`ChatError`]: Why a chat turn produced no answer.
//! - [`ExportError`]: Why a transcript could not be written.
//! - [`Role`]: Turn role (human, ai, system).
//! - [`Turn`]: A single entry of a session's history.
//! - [`DocumentContext`]: The text of the currently loaded document.

/// Loaded-document types.
pub mod document;

pub use document::{DocumentContext, DocumentFormat};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// --- Error types ---

/// Failure to turn a file into the active document context.
///
/// A failed load never modifies the existing context.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The path does not point at an existing file.
    #[error("File at {} does not exist", path.display())]
    FileNotFound {
        /// The path that was requested.
        path: PathBuf,
    },

    /// No parser is registered for the file's extension.
    #[error("Unsupported file format '{extension}'")]
    UnsupportedFormat {
        /// The lowercased extension (empty when the file has none).
        extension: String,
    },

    /// A parser was found but could not extract text.
    #[error("Failed to parse {format} document: {reason}")]
    ParseFailure {
        /// Format whose parser failed.
        format: DocumentFormat,
        /// Parser-specific description.
        reason: String,
    },
}

impl LoadError {
    /// Shorthand for [`LoadError::ParseFailure`].
    pub fn parse(format: DocumentFormat, reason: impl ToString) -> Self {
        Self::ParseFailure {
            format,
            reason: reason.to_string(),
        }
    }
}

/// Failure of a chat turn. History is never mutated when one is returned.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The language model call failed (transport, status, or payload).
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The language model did not answer within the configured timeout.
    #[error("Model did not respond within {secs}s")]
    Timeout {
        /// Configured timeout in seconds.
        secs: u64,
    },
}

/// Failure to write a session transcript.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Writing the destination file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The transcript could not be encoded.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Top-level error type for docchat.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Debug, thiserror::Error)]
pub enum DocchatError {
    /// A document could not be loaded.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// A chat turn failed.
    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    /// A transcript could not be exported.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// An error from an outbound HTTP request (e.g. LLM API call).
    #[error("HTTP error: {0}")]
    Http(String),
}

/// A convenience `Result` alias using [`DocchatError`].
pub type DocchatResult<T> = Result<T, DocchatError>;

// --- Turn types ---

/// The author of a [`Turn`].
///
/// Serialised as `human`, `ai` and `system`, the tags used by the exported
/// history format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end-user.
    Human,
    /// The language model.
    #[serde(rename = "ai", alias = "assistant")]
    Assistant,
    /// A system-level instruction.
    System,
}

impl Role {
    /// The wire tag of this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Human => "human",
            Role::Assistant => "ai",
            Role::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Who authored the turn.
    #[serde(rename = "type")]
    pub role: Role,
    /// The textual content.
    pub content: String,
    /// UTC timestamp of when the turn was recorded.
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Creates a turn stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Creates a [`Role::Human`] turn.
    pub fn human(content: impl Into<String>) -> Self {
        Self::new(Role::Human, content)
    }

    /// Creates a [`Role::Assistant`] turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Creates a [`Role::System`] turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}
