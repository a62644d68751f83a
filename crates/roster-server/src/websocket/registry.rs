//! Registry of open authenticated sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use roster_core::SessionId;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::session::{NORMAL_CLOSURE, Session};

/// Tracks every admitted session until it disconnects or is closed.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
    /// Mirrors `sessions.len()` so health checks avoid the lock.
    active_count: AtomicUsize,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            active_count: AtomicUsize::new(0),
        }
    }

    /// Insert a session.
    pub async fn add(&self, session: Arc<Session>) {
        let mut sessions = self.sessions.write().await;
        let _ = sessions.insert(session.id().clone(), session);
        self.active_count.store(sessions.len(), Ordering::Relaxed);
    }

    /// Remove a session by id. No-op when absent.
    pub async fn remove(&self, id: &SessionId) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(id).is_some() {
            debug!(session_id = %id, "session removed from registry");
        }
        self.active_count.store(sessions.len(), Ordering::Relaxed);
    }

    /// All open sessions. Closed sessions found along the way are pruned.
    pub async fn snapshot_open(&self) -> Vec<Arc<Session>> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.is_open());
        let pruned = before - sessions.len();
        if pruned > 0 {
            debug!(pruned, "pruned closed sessions");
        }
        self.active_count.store(sessions.len(), Ordering::Relaxed);
        sessions.values().cloned().collect()
    }

    /// Close every session with a normal-closure code and empty the registry.
    ///
    /// Sessions are closed after the lock is released. Closing only signals
    /// each connection, so a client with a full queue still gets its close
    /// frame once the frame in flight is written.
    pub async fn close_all_sessions(&self) {
        let drained: Vec<Arc<Session>> = {
            let mut sessions = self.sessions.write().await;
            self.active_count.store(0, Ordering::Relaxed);
            sessions.drain().map(|(_, s)| s).collect()
        };
        if drained.is_empty() {
            return;
        }
        info!(count = drained.len(), "closing all sessions");
        for session in drained {
            if !session.close(NORMAL_CLOSURE) {
                debug!(session_id = %session.id(), "session already closed");
            }
        }
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    /// Whether no sessions are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a session by id.
    pub async fn get(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
