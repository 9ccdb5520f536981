use chrono::{DateTime, Utc};
use docchat_core::{Role, Turn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The conversation history of one session key. Turns are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub key: String,
    turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(key: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            key: key.into(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_turn(&mut self, turn: Turn) {
        self.updated_at = Utc::now();
        self.turns.push(turn);
    }

    /// Record a completed exchange: the raw human input, then the answer.
    pub fn add_exchange(&mut self, human: impl Into<String>, assistant: impl Into<String>) {
        self.add_turn(Turn::human(human));
        self.add_turn(Turn::assistant(assistant));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// Number of turns authored by `role`.
    pub fn count_role(&self, role: Role) -> usize {
        self.turns.iter().filter(|t| t.role == role).count()
    }
}
