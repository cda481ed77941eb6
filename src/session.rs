//! Per-user conversation sessions
//!
//! One session exists per whitelisted identity, created eagerly at startup and
//! never destroyed. The store's mutex is held by the update endpoints across
//! the whole handling of an update, so command processing is serialized
//! system-wide and service-control side effects are never interleaved.

use std::collections::HashMap;

use tokio::sync::{Mutex, MutexGuard};

/// Conversation state. Currently every command resolves in one round trip, so
/// the only state is `Waiting`; the enum is the hook for multi-turn flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Waiting,
}

/// Per-identity conversation record.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: String,
    pub state: SessionState,
}

/// Identity → session map behind a single mutex.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    /// Build the store with one `Waiting` session per whitelisted identity.
    pub fn new(identities: &[String]) -> Self {
        let sessions = identities
            .iter()
            .map(|id| {
                (
                    id.clone(),
                    Session {
                        identity: id.clone(),
                        state: SessionState::Waiting,
                    },
                )
            })
            .collect();

        Self {
            sessions: Mutex::new(sessions),
        }
    }

    /// Acquire the store lock. The guard must be held for the full critical
    /// section of an update, including the systemctl call.
    pub async fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().await
    }
}
