use crate::session::Session;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Shared handle to one session. Holding the lock serialises every mutation
/// of that session's history.
pub type SessionRef = Arc<Mutex<Session>>;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Return the session for `key`, creating an empty one on first use.
    async fn get_or_create(&self, key: &str) -> SessionRef;
    async fn get(&self, key: &str) -> Option<SessionRef>;
    /// Returns whether a session was removed.
    async fn remove(&self, key: &str) -> bool;
    async fn list(&self) -> Vec<String>;
}

/// Process-local session store. History is lost on restart.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRef>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get_or_create(&self, key: &str) -> SessionRef {
        if let Some(existing) = self.sessions.read().await.get(key) {
            return existing.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(key.to_string())
            .or_insert_with(|| {
                debug!(session = %key, "Created session");
                Arc::new(Mutex::new(Session::new(key)))
            })
            .clone()
    }

    async fn get(&self, key: &str) -> Option<SessionRef> {
        self.sessions.read().await.get(key).cloned()
    }

    async fn remove(&self, key: &str) -> bool {
        self.sessions.write().await.remove(key).is_some()
    }

    async fn list(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}
