//! Remote hierarchical JSON document store.
//!
//! The store is addressed by slash-separated paths (`MASTER/Income`) and
//! reads and writes whole subtrees. Nothing here knows about records; the
//! sync engine and the backup service decide what to read and write.

mod http;
#[cfg(test)]
pub mod testing;

pub use http::HttpDocumentStore;

use std::future::Future;

use autobook_engine::Branch;
use serde_json::{json, Value};

/// Remote store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("database not found (404) at {path}")]
    NotProvisioned { path: String },

    #[error("access denied (401)")]
    AccessDenied,

    #[error("remote store responded with HTTP {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// What an operator should do about the failure.
    pub fn hint(&self) -> &'static str {
        match self {
            RemoteError::NotProvisioned { .. } => {
                "The database does not exist yet. Create the Realtime Database in the console \
                 (Build → Realtime Database → Create Database) and check REMOTE_STORE_URL."
            }
            RemoteError::AccessDenied => {
                "Access denied by the database rules. Allow read and write in Realtime Database → Rules."
            }
            RemoteError::Status(_) => "Unexpected response from the database. Check REMOTE_STORE_URL.",
            RemoteError::Network(_) => {
                "The database is unreachable. Check the network and REMOTE_STORE_URL."
            }
            RemoteError::Decode(_) => "The database returned data in an unexpected format.",
        }
    }
}

/// Result of a connectivity check against the store root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Ok,
    NotProvisioned,
    AccessDenied,
    Status(u16),
    Network(String),
}

impl ProbeOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ProbeOutcome::Ok)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ProbeOutcome::Ok => Some(200),
            ProbeOutcome::NotProvisioned => Some(404),
            ProbeOutcome::AccessDenied => Some(401),
            ProbeOutcome::Status(code) => Some(*code),
            ProbeOutcome::Network(_) => None,
        }
    }

    pub fn hint(&self) -> Option<String> {
        match self {
            ProbeOutcome::Ok => None,
            ProbeOutcome::NotProvisioned => Some(
                RemoteError::NotProvisioned {
                    path: String::new(),
                }
                .hint()
                .to_string(),
            ),
            ProbeOutcome::AccessDenied => Some(RemoteError::AccessDenied.hint().to_string()),
            ProbeOutcome::Status(code) => Some(format!(
                "HTTP {code}. {}",
                RemoteError::Status(*code).hint()
            )),
            ProbeOutcome::Network(message) => Some(format!(
                "{message}. {}",
                RemoteError::Network(String::new()).hint()
            )),
        }
    }
}

impl From<RemoteError> for ProbeOutcome {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::NotProvisioned { .. } => ProbeOutcome::NotProvisioned,
            RemoteError::AccessDenied => ProbeOutcome::AccessDenied,
            RemoteError::Status(code) => ProbeOutcome::Status(code),
            RemoteError::Network(message) => ProbeOutcome::Network(message),
            RemoteError::Decode(message) => ProbeOutcome::Network(message),
        }
    }
}

/// Access to the remote document store.
pub trait DocumentStore: Send + Sync + 'static {
    /// Read the subtree at `path`; JSON `null` reads as `None`.
    fn get(&self, path: &str) -> impl Future<Output = Result<Option<Value>, RemoteError>> + Send;

    /// Replace the subtree at `path`.
    fn put(&self, path: &str, value: &Value) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Child keys of `path` without their contents.
    fn shallow_keys(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Vec<String>, RemoteError>> + Send;

    /// Check that the store root is reachable.
    fn probe(&self) -> impl Future<Output = ProbeOutcome> + Send;
}

/// Create the `MASTER`, `TEST` and `BACKUP` branches that do not exist yet.
///
/// Never fails: problems are logged and the server keeps running on local
/// data.
pub async fn ensure_branches<S: DocumentStore>(store: &S) {
    let probe = store.probe().await;
    if !probe.is_ok() {
        tracing::warn!(
            outcome = ?probe,
            hint = %probe.hint().unwrap_or_default(),
            "Remote store is not reachable, skipping branch setup"
        );
        return;
    }

    for branch in Branch::ALL {
        match store.get(branch.as_str()).await {
            Ok(Some(_)) => {}
            Ok(None) => match store.put(branch.as_str(), &json!({})).await {
                Ok(()) => tracing::info!(branch = %branch, "Created remote branch"),
                Err(e) => tracing::warn!(branch = %branch, error = %e, "Failed to create remote branch"),
            },
            Err(e @ RemoteError::NotProvisioned { .. }) => {
                tracing::warn!(error = %e, hint = e.hint(), "Remote database not provisioned");
                return;
            }
            Err(e) => tracing::warn!(branch = %branch, error = %e, "Failed to read remote branch"),
        }
    }
}
