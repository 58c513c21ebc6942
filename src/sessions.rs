// Session registry: the revocable unit behind every bearer token.
//
// A token stays cryptographically valid after logout; what makes logout
// effective is that its embedded jti no longer resolves here. The store
// is a trait so a multi-process deployment can back it with an external
// cache; the in-memory implementation shipped below is single-instance.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Random, unguessable identifier. Doubles as the token's jti claim.
    pub jti: Uuid,
    pub user_id: Uuid,
    /// Username at login time; not refreshed on profile updates.
    pub username: String,
    /// Admin flag at login time.
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub label: Option<String>,
}

impl Session {
    pub fn for_user(user: &User) -> Self {
        Self {
            jti: Uuid::new_v4(),
            user_id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
            created_at: Utc::now(),
            label: None,
        }
    }
}

/// Patchable session metadata. The owning user and the jti are not here
/// on purpose; they can never change.
#[derive(Debug, Default, Clone)]
pub struct SessionPatch {
    pub label: Option<String>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a fresh session. Identifiers are generated by the caller
    /// (`Session::for_user`) and never reused, so concurrent logins for
    /// the same user each get their own record.
    async fn create(&self, session: Session);

    /// All sessions; callers filter by ownership.
    async fn list(&self) -> Vec<Session>;

    /// Absence is a normal outcome here, not an error.
    async fn get(&self, jti: Uuid) -> Option<Session>;

    /// Merge the patch into an existing record, returning the updated
    /// session, or None if the jti does not resolve.
    async fn update(&self, jti: Uuid, patch: SessionPatch) -> Option<Session>;

    /// Idempotent. Returns whether a record was actually removed.
    async fn delete(&self, jti: Uuid) -> bool;
}

/// In-memory registry. Sessions die with the process, which fails safe:
/// tokens embedding a lost jti are rejected on the liveness check.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: Session) {
        self.sessions.write().await.insert(session.jti, session);
    }

    async fn list(&self) -> Vec<Session> {
        self.sessions.read().await.values().cloned().collect()
    }

    async fn get(&self, jti: Uuid) -> Option<Session> {
        self.sessions.read().await.get(&jti).cloned()
    }

    async fn update(&self, jti: Uuid, patch: SessionPatch) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&jti)?;
        if let Some(label) = patch.label {
            session.label = Some(label);
        }
        Some(session.clone())
    }

    async fn delete(&self, jti: Uuid) -> bool {
        self.sessions.write().await.remove(&jti).is_some()
    }
}
