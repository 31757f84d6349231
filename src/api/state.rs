use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::ai::SharedProvider;
use crate::ai::chat::ChatSession;
use crate::core::AppConfig;

pub struct AppState {
    // Open chat sessions keyed by session ID. Removing a session
    // discards its transcript. Sessions a client abandons are removed
    // by `evict_idle`.
    pub sessions: HashMap<String, Arc<ChatSession>>,
    pub provider: SharedProvider,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig, provider: SharedProvider) -> Self {
        Self {
            sessions: HashMap::new(),
            provider,
            config,
        }
    }

    /// Open a new session and return it.
    pub fn open_session(&mut self) -> Arc<ChatSession> {
        self.evict_idle();
        let session = Arc::new(ChatSession::new(
            &self.config.title,
            Arc::clone(&self.provider),
        ));
        self.sessions
            .insert(session.id().to_string(), Arc::clone(&session));
        session
    }

    pub fn find_session(&self, id: &str) -> Option<Arc<ChatSession>> {
        self.sessions.get(id).cloned()
    }

    /// Close and forget a session. Returns false if it didn't exist.
    pub fn close_session(&mut self, id: &str) -> bool {
        match self.sessions.remove(id) {
            Some(session) => {
                session.close();
                true
            }
            None => false,
        }
    }

    /// Close and forget sessions idle for longer than the configured
    /// limit. Sessions waiting on a reply are kept. Returns the number
    /// of sessions removed.
    pub fn evict_idle(&mut self) -> usize {
        let max_idle = Duration::from_secs(self.config.session_idle_secs);
        let before = self.sessions.len();
        self.sessions.retain(|id, session| {
            let keep = session.is_waiting() || session.idle_for() <= max_idle;
            if !keep {
                tracing::info!("Evicting idle chat session {}", id);
                session.close();
            }
            keep
        });
        before - self.sessions.len()
    }
}
