//! Signed-in sessions.
//!
//! Bearer tokens map to the principal that signed in. The registry is written
//! through to the persisted store so sessions survive a restart.

use std::collections::HashMap;
use std::sync::Arc;

use autobook_engine::Principal;
use dashmap::DashMap;

use crate::storage::{PersistedStore, StorageError};

/// Persisted-store key of the session table.
pub const SESSIONS_KEY: &str = "autoservice-sessions";

/// Result of a login.
#[derive(Debug, Clone)]
pub struct Login {
    pub token: String,
    /// No other session was active.
    pub first: bool,
}

pub struct SessionRegistry {
    sessions: DashMap<String, Principal>,
    store: Arc<PersistedStore>,
}

impl SessionRegistry {
    /// Load the sessions left over from the previous run.
    pub fn load(store: Arc<PersistedStore>) -> Self {
        let saved: HashMap<String, Principal> = store.get_or_default(SESSIONS_KEY);
        if !saved.is_empty() {
            tracing::info!(count = saved.len(), "Restored sessions");
        }
        Self {
            sessions: saved.into_iter().collect(),
            store,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn persist(&self) -> Result<(), StorageError> {
        if self.sessions.is_empty() {
            return self.store.remove(SESSIONS_KEY);
        }
        let snapshot: HashMap<String, Principal> = self
            .sessions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        self.store.set(SESSIONS_KEY, &snapshot)
    }

    pub fn login(&self, principal: Principal) -> Result<Login, StorageError> {
        let first = self.sessions.is_empty();
        let token = uuid::Uuid::new_v4().to_string();

        tracing::info!(user = %principal.username, "Session opened");
        self.sessions.insert(token.clone(), principal);
        self.persist()?;
        Ok(Login { token, first })
    }

    pub fn get(&self, token: &str) -> Option<Principal> {
        self.sessions.get(token).map(|entry| entry.value().clone())
    }

    /// Close a session. Returns `Some(true)` when it was the last one and
    /// `None` for an unknown token.
    pub fn logout(&self, token: &str) -> Result<Option<bool>, StorageError> {
        let Some((_, principal)) = self.sessions.remove(token) else {
            return Ok(None);
        };
        tracing::info!(user = %principal.username, "Session closed");
        self.persist()?;
        Ok(Some(self.sessions.is_empty()))
    }

    /// Drop the sessions of a deleted user. Like [`logout`](Self::logout),
    /// returns `Some(true)` when no session is left and `None` when the user
    /// had none.
    pub fn revoke_user(&self, user_id: &str) -> Result<Option<bool>, StorageError> {
        let before = self.sessions.len();
        self.sessions.retain(|_, principal| principal.user_id != user_id);
        let removed = before - self.sessions.len();
        if removed == 0 {
            return Ok(None);
        }
        tracing::info!(user_id = %user_id, removed, "Sessions revoked");
        self.persist()?;
        Ok(Some(self.sessions.is_empty()))
    }
}
