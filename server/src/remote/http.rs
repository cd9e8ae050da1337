//! REST client for the remote document store.
//!
//! `GET`/`PUT {base}/{path}.json` read and replace subtrees; `?shallow=true`
//! lists child keys; `GET {base}/.json` probes the root.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use super::{DocumentStore, ProbeOutcome, RemoteError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    http: Client,
    base: String,
}

impl HttpDocumentStore {
    pub fn new(base_url: &str) -> Result<Self, RemoteError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        if path.is_empty() {
            format!("{}/.json", self.base)
        } else {
            format!("{}/{}.json", self.base, path)
        }
    }

    fn check(response: Response, path: &str) -> Result<Response, RemoteError> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED => Err(RemoteError::AccessDenied),
            StatusCode::NOT_FOUND => Err(RemoteError::NotProvisioned {
                path: path.to_string(),
            }),
            status => Err(RemoteError::Status(status.as_u16())),
        }
    }

    async fn fetch(&self, path: &str, shallow: bool) -> Result<Value, RemoteError> {
        let url = self.url(path);
        tracing::debug!(url = %url, shallow, "Fetching from remote store");

        let mut request = self.http.get(&url);
        if shallow {
            request = request.query(&[("shallow", "true")]);
        }
        let response = request.send().await.map_err(network)?;
        let response = Self::check(response, path)?;
        response
            .json::<Value>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

fn network(error: reqwest::Error) -> RemoteError {
    RemoteError::Network(error.to_string())
}

impl DocumentStore for HttpDocumentStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, RemoteError> {
        match self.fetch(path, false).await? {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }

    async fn put(&self, path: &str, value: &Value) -> Result<(), RemoteError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "Writing to remote store");

        let response = self.http.put(&url).json(value).send().await.map_err(network)?;
        Self::check(response, path)?;
        Ok(())
    }

    async fn shallow_keys(&self, path: &str) -> Result<Vec<String>, RemoteError> {
        match self.fetch(path, true).await? {
            Value::Null => Ok(Vec::new()),
            Value::Object(map) => Ok(map.into_iter().map(|(key, _)| key).collect()),
            other => Err(RemoteError::Decode(format!(
                "expected an object of keys, got {other}"
            ))),
        }
    }

    async fn probe(&self) -> ProbeOutcome {
        let url = self.url("");
        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return ProbeOutcome::Network(e.to_string()),
        };
        match Self::check(response, "") {
            Ok(_) => ProbeOutcome::Ok,
            Err(e) => e.into(),
        }
    }
}
