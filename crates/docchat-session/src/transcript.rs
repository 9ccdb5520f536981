use crate::session::Session;
use docchat_core::{ExportError, Role, Turn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

// ---------------------------------------------------------------------------
// PairingMode
// ---------------------------------------------------------------------------

/// How human turns are matched with answers when a transcript is exported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairingMode {
    /// Every human turn is paired with the first `ai` turn of the whole
    /// history, so with several exchanges the first answer repeats. This is
    /// the historical export format and the default.
    #[default]
    FirstAssistant,
    /// Every human turn is paired with the next `ai` turn that follows it
    /// before another human turn.
    Chronological,
}

impl FromStr for PairingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first-assistant" | "literal" => Ok(Self::FirstAssistant),
            "chronological" | "corrected" => Ok(Self::Chronological),
            other => Err(format!(
                "unknown pairing mode '{other}' (expected 'first-assistant' or 'chronological')"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptPair {
    pub user_query: String,
    pub ai_response: String,
}

/// Simplified export of a session: `{ "messages": [{user_query, ai_response}] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub messages: Vec<TranscriptPair>,
}

impl Transcript {
    pub fn from_turns(turns: &[Turn], mode: PairingMode) -> Self {
        let first_answer = turns
            .iter()
            .find(|t| t.role == Role::Assistant)
            .map(|t| t.content.as_str());

        let messages = turns
            .iter()
            .enumerate()
            .filter(|(_, t)| t.role == Role::Human)
            .filter_map(|(i, human)| {
                let answer = match mode {
                    // An empty first answer counts as no answer.
                    PairingMode::FirstAssistant => first_answer.filter(|a| !a.is_empty()),
                    PairingMode::Chronological => turns[i + 1..]
                        .iter()
                        .take_while(|t| t.role != Role::Human)
                        .find(|t| t.role == Role::Assistant)
                        .map(|t| t.content.as_str()),
                }?;
                Some(TranscriptPair {
                    user_query: human.content.clone(),
                    ai_response: answer.to_string(),
                })
            })
            .collect();

        Self { messages }
    }

    /// Pretty-printed JSON with two-space indentation.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ---------------------------------------------------------------------------
// TranscriptExporter
// ---------------------------------------------------------------------------

/// Writes session transcripts to disk, overwriting existing files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranscriptExporter {
    mode: PairingMode,
}

impl TranscriptExporter {
    pub fn new(mode: PairingMode) -> Self {
        Self { mode }
    }

    /// Reads the session, never mutates it.
    pub async fn export(&self, session: &Session, path: &Path) -> Result<Transcript, ExportError> {
        let transcript = Transcript::from_turns(session.turns(), self.mode);
        tokio::fs::write(path, transcript.to_json()?).await?;
        info!(
            session = %session.key,
            path = %path.display(),
            pairs = transcript.messages.len(),
            "History saved"
        );
        Ok(transcript)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
