//! Session storage and per-session serialization
//!
//! One `SessionContext` per opaque session id, created on first contact and
//! fully overwritten every turn. The turn handler's read-compute-write
//! sequence is not atomic, so concurrent turns for the same session are
//! serialized through [`SessionLocks`]; different sessions never contend.

use crate::dialogue::SessionContext;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

#[derive(Error, Debug)]
pub enum SessionError {
    /// The in-memory backend has no failing paths; external backings
    /// surface their faults through this.
    #[allow(dead_code)]
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Storage for per-session dialogue contexts.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> SessionResult<Option<SessionContext>>;

    /// Full overwrite of the stored context.
    async fn put(&self, session_id: &str, context: SessionContext) -> SessionResult<()>;

    /// Used on the forced-reset failure path; deleting an absent session is
    /// not an error.
    async fn delete(&self, session_id: &str) -> SessionResult<()>;
}

struct Entry {
    context: SessionContext,
    touched_at: DateTime<Utc>,
}

/// In-memory session store with idle-entry eviction.
#[derive(Default)]
pub struct InMemorySessionStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop entries idle for longer than `max_idle`. Returns how many were
    /// evicted.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let idle = chrono::Duration::seconds(i64::try_from(max_idle.as_secs()).unwrap_or(i64::MAX));
        let cutoff = Utc::now() - idle;
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.touched_at >= cutoff);
        before - entries.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> SessionResult<Option<SessionContext>> {
        Ok(self
            .entries
            .read()
            .await
            .get(session_id)
            .map(|entry| entry.context.clone()))
    }

    async fn put(&self, session_id: &str, context: SessionContext) -> SessionResult<()> {
        self.entries.write().await.insert(
            session_id.to_string(),
            Entry {
                context,
                touched_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> SessionResult<()> {
        self.entries.write().await.remove(session_id);
        Ok(())
    }
}

// ============================================================================
// Per-Session Locks
// ============================================================================

/// Hands out one mutex per session id so each session is processed
/// at-most-once-at-a-time.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the turn lock for a session, creating it on first contact.
    pub async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drop locks nobody currently holds; called from the eviction sweep so
    /// the registry doesn't grow with every session ever seen.
    pub async fn prune(&self) {
        self.locks
            .lock()
            .await
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::ConversationState;

    #[tokio::test]
    async fn put_get_delete_roundtrip() {
        let store = InMemorySessionStore::new();
        assert!(store.get("s1").await.unwrap().is_none());

        let context = SessionContext::new(ConversationState::CitySelection);
        store.put("s1", context.clone()).await.unwrap();
        assert_eq!(store.get("s1").await.unwrap(), Some(context));

        store.delete("s1").await.unwrap();
        assert!(store.get("s1").await.unwrap().is_none());

        // Deleting again is a no-op, not an error.
        store.delete("s1").await.unwrap();
    }

    #[tokio::test]
    async fn put_is_full_overwrite() {
        let store = InMemorySessionStore::new();
        let mut context = SessionContext::new(ConversationState::OutletSelection);
        context.city = Some("Delhi".to_string());
        store.put("s1", context).await.unwrap();

        store
            .put("s1", SessionContext::new(ConversationState::InitialGreeting))
            .await
            .unwrap();
        let stored = store.get("s1").await.unwrap().unwrap();
        assert_eq!(stored.current_state, ConversationState::InitialGreeting);
        assert_eq!(stored.city, None);
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted_and_active_ones_kept() {
        let store = InMemorySessionStore::new();
        store.put("old", SessionContext::default()).await.unwrap();

        assert_eq!(store.evict_idle(Duration::from_secs(3600)).await, 0);
        assert!(store.get("old").await.unwrap().is_some());

        assert_eq!(store.evict_idle(Duration::ZERO).await, 1);
        assert!(store.get("old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn same_session_turns_are_serialized() {
        let locks = Arc::new(SessionLocks::new());
        let guard = locks.acquire("s1").await;

        // A second acquire for the same session must wait...
        let contended = tokio::time::timeout(Duration::from_millis(20), locks.acquire("s1")).await;
        assert!(contended.is_err());

        // ...while a different session proceeds immediately.
        let other = tokio::time::timeout(Duration::from_millis(20), locks.acquire("s2")).await;
        assert!(other.is_ok());

        drop(guard);
        let released = tokio::time::timeout(Duration::from_millis(20), locks.acquire("s1")).await;
        assert!(released.is_ok());
    }

    #[tokio::test]
    async fn prune_keeps_held_locks() {
        let locks = SessionLocks::new();
        let guard = locks.acquire("held").await;
        drop(locks.acquire("idle").await);

        locks.prune().await;
        assert_eq!(locks.locks.lock().await.len(), 1);
        drop(guard);

        locks.prune().await;
        assert!(locks.locks.lock().await.is_empty());
    }
}
