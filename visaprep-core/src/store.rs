//! In-memory session store.
//!
//! Sessions live in a `RwLock<HashMap>`: lookups share the lock, saves take it
//! exclusively. Nothing is persisted across restarts.
//!
//! Retention: every save drops sessions idle longer than the configured TTL
//! and, if the store is still over capacity, evicts the least recently
//! updated sessions until it fits.

use crate::config::StoreConfig;
use crate::types::{Level, Scores, Session, SessionStatus};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Upper bound for the idle TTL (about a century).
const MAX_TTL_MINUTES: u64 = 60 * 24 * 365 * 100;

/// Thread-safe map of session id to session.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    config: StoreConfig,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl SessionStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    // Writes replace whole sessions, so a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Session>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Session>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create and store an empty active session.
    ///
    /// The caller fills `selected_questions` and `current_question` and saves
    /// the session again.
    pub fn create(&self, user_id: Option<String>, level: Level) -> Session {
        let now = Utc::now();
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.filter(|u| !u.trim().is_empty()),
            level,
            current_question: String::new(),
            selected_questions: Vec::new(),
            question_index: 0,
            answers: Vec::new(),
            scores: Scores::default(),
            status: SessionStatus::Active,
            created_at: now,
            updated_at: now,
            summary: None,
        };

        self.write().insert(session.id.clone(), session.clone());
        tracing::debug!(session_id = %session.id, level = %level, "Session created");
        session
    }

    /// Upsert a session, bumping `updated_at`.
    pub fn save(&self, session: &mut Session) {
        session.updated_at = Utc::now();
        let mut sessions = self.write();
        sessions.insert(session.id.clone(), session.clone());
        let pruned = prune_locked(&mut sessions, &self.config, &session.id);
        if pruned > 0 {
            tracing::info!(pruned, remaining = sessions.len(), "Pruned idle sessions");
        }
    }

    /// Snapshot of a session.
    pub fn get(&self, id: &str) -> Option<Session> {
        self.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

/// Retention pass over a locked map. `keep` is never evicted.
fn prune_locked(sessions: &mut HashMap<String, Session>, config: &StoreConfig, keep: &str) -> usize {
    let before = sessions.len();
    let minutes = config.idle_ttl_minutes.min(MAX_TTL_MINUTES) as i64;
    let cutoff = Utc::now() - Duration::minutes(minutes);

    sessions.retain(|id, s| id == keep || s.updated_at >= cutoff);

    if sessions.len() > config.max_sessions {
        let mut by_age: Vec<(chrono::DateTime<Utc>, String)> = sessions
            .iter()
            .filter(|(id, _)| id.as_str() != keep)
            .map(|(id, s)| (s.updated_at, id.clone()))
            .collect();
        by_age.sort();

        let excess = sessions.len() - config.max_sessions;
        for (_, id) in by_age.into_iter().take(excess) {
            sessions.remove(&id);
        }
    }

    before - sessions.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_create_assigns_unique_ids() {
        let store = SessionStore::default();
        let a = store.create(None, Level::Easy);
        let b = store.create(Some("user-1".to_string()), Level::Hard);

        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
        assert_eq!(b.user_id.as_deref(), Some("user-1"));
        assert_eq!(a.status, SessionStatus::Active);
        assert_eq!(a.question_index, 0);
    }

    #[test]
    fn test_blank_user_id_is_anonymous() {
        let store = SessionStore::default();
        let s = store.create(Some("  ".to_string()), Level::Easy);
        assert_eq!(s.user_id, None);
    }

    #[test]
    fn test_save_bumps_updated_at_and_upserts() {
        let store = SessionStore::default();
        let mut s = store.create(None, Level::Medium);
        let created = s.updated_at;

        std::thread::sleep(std::time::Duration::from_millis(5));
        s.question_index = 1;
        store.save(&mut s);

        let loaded = store.get(&s.id).unwrap();
        assert_eq!(loaded.question_index, 1);
        assert!(loaded.updated_at > created);
        assert_eq!(loaded.created_at, s.created_at);
    }

    #[test]
    fn test_get_unknown_is_none() {
        let store = SessionStore::default();
        assert!(store.get("missing").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_ttl_prunes_idle_sessions() {
        let store = SessionStore::new(StoreConfig {
            max_sessions: 100,
            idle_ttl_minutes: 30,
        });
        let stale = store.create(None, Level::Easy);
        {
            let mut sessions = store.write();
            let entry = sessions.get_mut(&stale.id).unwrap();
            entry.updated_at = Utc::now() - Duration::minutes(31);
        }

        let mut fresh = store.create(None, Level::Easy);
        store.save(&mut fresh);

        assert!(store.get(&stale.id).is_none());
        assert!(store.get(&fresh.id).is_some());
    }

    #[test]
    fn test_capacity_evicts_oldest_but_keeps_saved() {
        let store = SessionStore::new(StoreConfig {
            max_sessions: 2,
            idle_ttl_minutes: 60,
        });
        let mut first = store.create(None, Level::Easy);
        std::thread::sleep(std::time::Duration::from_millis(2));
        let mut second = store.create(None, Level::Easy);
        store.save(&mut second);
        std::thread::sleep(std::time::Duration::from_millis(2));
        let mut third = store.create(None, Level::Easy);
        store.save(&mut third);

        assert_eq!(store.len(), 2);
        assert!(store.get(&first.id).is_none());

        // re-saving an evicted session brings it back and evicts the oldest
        store.save(&mut first);
        assert!(store.get(&first.id).is_some());
        assert!(store.get(&second.id).is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_concurrent_sessions() {
        let store = Arc::new(SessionStore::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let mut s = store.create(None, Level::Easy);
                    for i in 0..10 {
                        s.question_index = i;
                        store.save(&mut s);
                    }
                    s.id
                })
            })
            .collect();

        for h in handles {
            let id = h.join().unwrap();
            assert_eq!(store.get(&id).unwrap().question_index, 9);
        }
        assert_eq!(store.len(), 8);
    }
}
