use docchat_core::{DocumentContext, Role, Turn};
use serde_json::{json, Value};

/// Instruction sent as the system message of every chat call unless the
/// configuration overrides it.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a document-based chatbot. Your task is to help \
users extract information and insights from uploaded documents. Only answer questions based on \
the uploaded content. If a question is unrelated or beyond your scope, respond with: \
\"I'm sorry, I can't answer that.\" Your responses should be concise and accurate. Be polite and \
helpful at all times";

/// Separator between the document text and the user's input.
pub const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Everything sent to the model for one chat turn. Built per call and
/// never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptEnvelope {
    pub system_prompt: String,
    /// Snapshot of the session history, oldest first.
    pub history: Vec<Turn>,
    /// The outgoing human message: the raw input, prefixed by the document
    /// text when one is loaded.
    pub human_input: String,
}

impl PromptEnvelope {
    pub fn compose(
        system_prompt: impl Into<String>,
        history: Vec<Turn>,
        document: Option<&DocumentContext>,
        input: &str,
    ) -> Self {
        let human_input = match document {
            Some(doc) => format!("{}{DOCUMENT_SEPARATOR}{input}", doc.content),
            None => input.to_string(),
        };
        Self {
            system_prompt: system_prompt.into(),
            history,
            human_input,
        }
    }

    /// Role/content messages in the shape shared by Ollama and the
    /// OpenAI-compatible APIs.
    pub fn chat_messages(&self) -> Vec<Value> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(json!({ "role": "system", "content": self.system_prompt }));
        for turn in &self.history {
            let role = match turn.role {
                Role::Human => "user",
                Role::Assistant => "assistant",
                Role::System => "system",
            };
            messages.push(json!({ "role": role, "content": turn.content }));
        }
        messages.push(json!({ "role": "user", "content": self.human_input }));
        messages
    }
}
