//! Test doubles for the remote store: an in-memory [`DocumentStore`] and a
//! throwaway HTTP server speaking the store's REST dialect.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{Map, Value};

use super::{DocumentStore, ProbeOutcome, RemoteError};

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

pub fn lookup<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(tree, |node, key| match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

pub fn assign(tree: &mut Value, path: &str, value: Value) {
    let keys: Vec<&str> = segments(path).collect();
    assign_at(tree, &keys, value);
}

fn assign_at(node: &mut Value, keys: &[&str], value: Value) {
    let Some((first, rest)) = keys.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else { return };
    if rest.is_empty() && value.is_null() {
        map.remove(*first);
        return;
    }
    let child = map.entry(first.to_string()).or_insert(Value::Null);
    assign_at(child, rest, value);
}

fn child_keys(node: Option<&Value>) -> Vec<String> {
    match node {
        Some(Value::Object(map)) => map.keys().cloned().collect(),
        Some(Value::Array(items)) => (0..items.len()).map(|i| i.to_string()).collect(),
        _ => Vec::new(),
    }
}

#[derive(Default)]
struct Inner {
    tree: Value,
    failure: Option<RemoteError>,
    puts: Vec<(String, Value)>,
    get_delay: Option<Duration>,
    put_delay: Option<Duration>,
}

/// In-memory document store with failure injection.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn with_tree(tree: Value) -> Self {
        let store = Self::default();
        store.lock().tree = tree;
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn fail_with(&self, error: RemoteError) {
        self.lock().failure = Some(error);
    }

    pub fn recover(&self) {
        self.lock().failure = None;
    }

    /// Delay every read, to let a test act while a fetch is in flight.
    pub fn delay_reads(&self, delay: Duration) {
        self.lock().get_delay = Some(delay);
    }

    /// Delay every write before it lands.
    pub fn delay_writes(&self, delay: Duration) {
        self.lock().put_delay = Some(delay);
    }

    pub fn value_at(&self, path: &str) -> Option<Value> {
        lookup(&self.lock().tree, path).cloned()
    }

    pub fn put_paths(&self) -> Vec<String> {
        self.lock().puts.iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn put_count(&self, path: &str) -> usize {
        self.lock().puts.iter().filter(|(p, _)| p == path).count()
    }

    fn check(&self) -> Result<(), RemoteError> {
        match &self.lock().failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, RemoteError> {
        let delay = self.lock().get_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check()?;
        Ok(lookup(&self.lock().tree, path)
            .filter(|v| !v.is_null())
            .cloned())
    }

    async fn put(&self, path: &str, value: &Value) -> Result<(), RemoteError> {
        let delay = self.lock().put_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check()?;
        let mut inner = self.lock();
        assign(&mut inner.tree, path, value.clone());
        inner.puts.push((path.to_string(), value.clone()));
        Ok(())
    }

    async fn shallow_keys(&self, path: &str) -> Result<Vec<String>, RemoteError> {
        self.check()?;
        Ok(child_keys(lookup(&self.lock().tree, path)))
    }

    async fn probe(&self) -> ProbeOutcome {
        match self.check() {
            Ok(()) => ProbeOutcome::Ok,
            Err(e) => e.into(),
        }
    }
}

#[derive(Default)]
pub struct FakeState {
    pub tree: Value,
    /// Answer every request with this status instead.
    pub status: Option<StatusCode>,
    pub requests: Vec<String>,
}

/// A remote store served over HTTP on an ephemeral local port.
pub struct FakeRemote {
    pub base_url: String,
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeRemote {
    pub fn tree(&self) -> Value {
        self.state.lock().unwrap().tree.clone()
    }

    pub fn respond_with(&self, status: Option<StatusCode>) {
        self.state.lock().unwrap().status = status;
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }
}

type Shared = Arc<Mutex<FakeState>>;

fn store_path(raw: &str) -> Option<String> {
    raw.strip_suffix(".json").map(|p| p.trim_end_matches('/').to_string())
}

async fn read(
    State(state): State<Shared>,
    Path(raw): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    let shallow = query.get("shallow").map(String::as_str) == Some("true");
    state.requests.push(format!(
        "GET /{raw}{}",
        if shallow { "?shallow=true" } else { "" }
    ));
    if let Some(status) = state.status {
        return (status, Json(Value::Null)).into_response();
    }
    let Some(path) = store_path(&raw) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let node = lookup(&state.tree, &path);
    if shallow {
        let keys: Map<String, Value> = child_keys(node)
            .into_iter()
            .map(|k| (k, Value::Bool(true)))
            .collect();
        return Json(if keys.is_empty() {
            Value::Null
        } else {
            Value::Object(keys)
        })
        .into_response();
    }
    Json(node.cloned().unwrap_or(Value::Null)).into_response()
}

async fn write(
    State(state): State<Shared>,
    Path(raw): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.requests.push(format!("PUT /{raw}"));
    if let Some(status) = state.status {
        return (status, Json(Value::Null)).into_response();
    }
    let Some(path) = store_path(&raw) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    assign(&mut state.tree, &path, body.clone());
    Json(body).into_response()
}

/// Serve a fake remote store on `127.0.0.1:0`.
pub async fn spawn_fake_remote(tree: Value) -> FakeRemote {
    let state: Shared = Arc::new(Mutex::new(FakeState {
        tree,
        ..Default::default()
    }));
    let app = Router::new()
        .route("/{*path}", get(read).put(write))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeRemote {
        base_url: format!("http://{addr}"),
        state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn assign_and_lookup() {
        let mut tree = Value::Null;
        assign(&mut tree, "BACKUP/2024-01-01", json!({"data": 1}));
        assign(&mut tree, "MASTER/Income", json!([{"id": "a"}]));
        assert_eq!(lookup(&tree, "BACKUP/2024-01-01/data"), Some(&json!(1)));
        assert_eq!(lookup(&tree, "MASTER/Income/0/id"), Some(&json!("a")));
        assert_eq!(child_keys(lookup(&tree, "")), vec!["BACKUP", "MASTER"]);

        assign(&mut tree, "MASTER/Income", Value::Null);
        assert!(lookup(&tree, "MASTER/Income").is_none());
    }
}
