//! Language model client and the session context manager.
//!
//! [`SessionContextManager`] owns the per-session histories and the active
//! document, composes a [`PromptEnvelope`] for every chat turn and hands it to
//! an [`LlmClient`].

pub mod backends;
pub mod config;
pub mod llm;
pub mod manager;
pub mod prompt;

pub use backends::LlmBackend;
pub use config::{LlmProvider, ModelConfig};
pub use llm::LlmClient;
pub use manager::SessionContextManager;
pub use prompt::{PromptEnvelope, DEFAULT_SYSTEM_PROMPT};
