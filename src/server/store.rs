use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Server-held session keyed by the opaque cookie value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub csrf_token: String,
    pub authenticated: bool,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn new(ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().simple().to_string(),
            csrf_token: generate_token(),
            authenticated: false,
            address: None,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// 32 random bytes, hex encoded
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// In-memory session table plus the set of wallet signatures already consumed
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    /// sha256(canonical signature) -> assertion time, kept while the assertion could still be fresh
    consumed: Arc<RwLock<HashMap<[u8; 32], DateTime<Utc>>>>,
    ttl: Duration,
    assertion_window: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration, assertion_window: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            consumed: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            assertion_window,
        }
    }

    pub async fn create(&self) -> Session {
        let session = Session::new(self.ttl);
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session.clone());
        tracing::debug!("Created session {}", session.id);
        session
    }

    /// Live session for `id`; an expired entry is dropped and reported as absent
    pub async fn get(&self, id: &str) -> Option<Session> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                Some(session) if !session.is_expired(now) => return Some(session.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions.remove(id);
        tracing::debug!("Session {} expired", id);
        None
    }

    /// Authenticate a live session for `address` under a fresh id.
    ///
    /// The old id stops resolving; the CSRF token and expiry carry over.
    pub async fn authenticate(&self, id: &str, address: &str) -> Option<Session> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let mut session = sessions.remove(id).filter(|s| !s.is_expired(now))?;
        session.id = Uuid::new_v4().simple().to_string();
        session.authenticated = true;
        session.address = Some(address.to_string());
        sessions.insert(session.id.clone(), session.clone());
        tracing::debug!("Session {} authenticated as {}", session.id, address);
        Some(session)
    }

    pub async fn destroy(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id).is_some()
    }

    /// Record a canonical signature as used. Returns false if it was already consumed.
    pub async fn consume_signature(&self, canonical: &[u8; 64], asserted_at: DateTime<Utc>) -> bool {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&Sha256::digest(canonical));
        let cutoff = Utc::now() - self.assertion_window;

        let mut consumed = self.consumed.write().await;
        consumed.retain(|_, at| *at >= cutoff);
        if consumed.contains_key(&digest) {
            return false;
        }
        consumed.insert(digest, asserted_at);
        true
    }

    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
