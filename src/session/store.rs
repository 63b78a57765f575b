//! Session store
//!
//! Responsible for reading and persisting session slot values.
//! In-memory by default; Postgres when a database URL is configured.

use crate::session::{merge, PostgresSessionStore, Session};
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Trait for session persistence
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Current slots; an unknown (or expired) id reads as an empty session
    async fn get(&self, session_id: &str) -> Result<Session>;

    /// Persist a shallow merge of `updates` and return the merged session
    async fn merge(&self, session_id: &str, updates: &Session) -> Result<Session>;

    /// Delete every expired session, returning how many were removed
    async fn purge_expired(&self) -> Result<u64>;
}

#[derive(Debug, Clone)]
struct StoredSession {
    data: Session,
    updated_at: DateTime<Utc>,
}

/// In-memory session store with an idle TTL
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, StoredSession>>>,
    ttl: Option<Duration>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: None,
        }
    }

    /// Sessions idle for at least `ttl` read as empty and get evicted
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Some(ttl),
        }
    }

    fn is_expired(&self, stored: &StoredSession, now: DateTime<Utc>) -> bool {
        self.ttl
            .map(|ttl| now - stored.updated_at >= ttl)
            .unwrap_or(false)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Session> {
        let now = Utc::now();

        {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                None => return Ok(Session::new()),
                Some(stored) if !self.is_expired(stored, now) => return Ok(stored.data.clone()),
                Some(_) => {}
            }
        }

        debug!(session_id, "Session expired, evicting");
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(session_id)
            .is_some_and(|stored| self.is_expired(stored, now))
        {
            sessions.remove(session_id);
        }
        Ok(Session::new())
    }

    async fn merge(&self, session_id: &str, updates: &Session) -> Result<Session> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        let current = match sessions.get(session_id) {
            Some(stored) if !self.is_expired(stored, now) => stored.data.clone(),
            _ => Session::new(),
        };

        let merged = merge(&current, updates);
        sessions.insert(
            session_id.to_string(),
            StoredSession {
                data: merged.clone(),
                updated_at: now,
            },
        );

        Ok(merged)
    }

    async fn purge_expired(&self) -> Result<u64> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| !self.is_expired(stored, now));
        let removed = (before - sessions.len()) as u64;
        if removed > 0 {
            info!(removed, "Purged expired sessions");
        }
        Ok(removed)
    }
}

/// Sweep interval for a TTL: a quarter of it, between one minute and one hour
pub fn purge_interval(ttl: Duration) -> std::time::Duration {
    (ttl / 4)
        .to_std()
        .unwrap_or(PURGE_INTERVAL_MAX)
        .clamp(PURGE_INTERVAL_MIN, PURGE_INTERVAL_MAX)
}

const PURGE_INTERVAL_MIN: std::time::Duration = std::time::Duration::from_secs(60);
const PURGE_INTERVAL_MAX: std::time::Duration = std::time::Duration::from_secs(3600);

/// Periodically purge expired sessions on the current runtime
pub fn spawn_purge_task(store: Arc<dyn SessionStore>, every: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(e) = store.purge_expired().await {
                warn!("Session purge failed: {}", e);
            }
        }
    })
}

/// Pick the session backend: Postgres when a URL is given and the pool can be
/// created, otherwise in-memory.
pub fn build_session_store(database_url: Option<&str>, ttl: Option<Duration>) -> Arc<dyn SessionStore> {
    if let Some(url) = database_url {
        match PostgresSessionStore::connect_lazy(url, ttl) {
            Ok(store) => {
                info!("Session store backend: postgres");
                return Arc::new(store);
            }
            Err(error) => {
                warn!(
                    "Failed to initialize postgres session store, falling back to in-memory: {}",
                    error
                );
            }
        }
    }

    info!("Session store backend: in-memory");
    match ttl {
        Some(ttl) => Arc::new(InMemorySessionStore::with_ttl(ttl)),
        None => Arc::new(InMemorySessionStore::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn updates(value: serde_json::Value) -> Session {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_unknown_session_reads_empty() {
        let store = InMemorySessionStore::new();
        assert!(store.get("nobody").await.unwrap().is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_merge_persists_last_write_wins() {
        let store = InMemorySessionStore::new();
        store.merge("s1", &updates(json!({"capital": 1000}))).await.unwrap();
        store
            .merge("s1", &updates(json!({"capital": 2000, "risk_tier": "high"})))
            .await
            .unwrap();

        let session = store.get("s1").await.unwrap();
        assert_eq!(session["capital"], json!(2000));
        assert_eq!(session["risk_tier"], json!("high"));
        assert!(store.get("s2").await.unwrap().is_empty());
    }

    #[test]
    fn test_merge_twice_is_idempotent() {
        let store = InMemorySessionStore::new();
        let update = updates(json!({"risk_tier": "low"}));

        let once = tokio_test::block_on(store.merge("s", &update)).unwrap();
        let twice = tokio_test::block_on(store.merge("s", &update)).unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_expired_sessions_read_empty_and_are_evicted() {
        let store = InMemorySessionStore::with_ttl(Duration::zero());
        store.merge("s1", &updates(json!({"capital": 1}))).await.unwrap();

        assert!(store.get("s1").await.unwrap().is_empty());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_purge_keeps_live_sessions() {
        let store = InMemorySessionStore::with_ttl(Duration::hours(1));
        store.merge("live", &updates(json!({"capital": 1}))).await.unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 0);
        assert_eq!(store.get("live").await.unwrap()["capital"], json!(1));
    }

    #[tokio::test]
    async fn test_purge_task_drops_idle_sessions() {
        let store = Arc::new(InMemorySessionStore::with_ttl(Duration::zero()));
        store.merge("idle", &updates(json!({"capital": 1}))).await.unwrap();
        assert_eq!(store.len().await, 1);

        let task = spawn_purge_task(store.clone(), std::time::Duration::from_millis(10));
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        task.abort();

        assert_eq!(store.len().await, 0);
    }

    #[test]
    fn test_purge_interval_is_clamped() {
        assert_eq!(purge_interval(Duration::hours(24)), std::time::Duration::from_secs(3600));
        assert_eq!(purge_interval(Duration::seconds(10)), std::time::Duration::from_secs(60));
        assert_eq!(purge_interval(Duration::minutes(20)), std::time::Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_build_without_database_is_in_memory() {
        let store = build_session_store(None, None);
        let merged = store.merge("x", &updates(json!({"capital": 5}))).await.unwrap();
        assert_eq!(merged["capital"], json!(5));
    }
}
