//! HTTP route definitions.

mod auth;
mod backups;
mod bookings;
mod export;
mod health;
mod income;
mod prices;
mod settings;
mod sync;
mod users;

use crate::AppState;
use axum::Router;
use serde::Deserialize;

use crate::error::{AppError, Result};
use autobook_engine::CollectionKind;

/// Create all application routes.
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(income::routes())
        .merge(bookings::routes())
        .merge(prices::routes())
        .merge(users::routes())
        .merge(export::routes())
        .merge(settings::routes())
        .merge(sync::routes())
        .merge(backups::routes())
}

/// Body of operations that overwrite local data.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Confirmation {
    pub confirm: bool,
    pub collection: Option<String>,
}

impl Confirmation {
    fn require(&self) -> Result<()> {
        if self.confirm {
            Ok(())
        } else {
            Err(AppError::BadRequest(
                "this replaces local data; send {\"confirm\": true} to proceed".into(),
            ))
        }
    }
}

fn collection_kind(raw: &str) -> Result<CollectionKind> {
    raw.parse().map_err(AppError::BadRequest)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::remote::testing::{spawn_fake_remote, FakeRemote};
    use crate::storage::ChangeReceiver;
    use crate::{app, AppState};

    pub struct TestApp {
        pub state: AppState,
        pub remote: FakeRemote,
        pub changes: ChangeReceiver,
        _dir: tempfile::TempDir,
    }

    impl TestApp {
        pub async fn new(hostname: &str, tree: Value) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let remote = spawn_fake_remote(tree).await;

            let vars: HashMap<&str, String> = HashMap::from([
                ("REMOTE_STORE_URL", remote.base_url.clone()),
                ("DATA_DIR", dir.path().display().to_string()),
                ("PUBLIC_HOSTNAME", hostname.to_string()),
            ]);
            let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();
            let (state, changes) = AppState::open(config).unwrap();

            Self {
                state,
                remote,
                changes,
                _dir: dir,
            }
        }

        pub async fn request(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = app(self.state.clone()).oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value = serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
            (status, value)
        }

        pub async fn login(&self, username: &str, password: &str) -> String {
            let (status, body) = self
                .request(
                    Method::POST,
                    "/auth/login",
                    None,
                    Some(serde_json::json!({"username": username, "password": password})),
                )
                .await;
            assert_eq!(status, StatusCode::OK, "{body}");

            // Let the background load of the first session settle.
            for _ in 0..50 {
                if self.state.sync.is_loaded() {
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            }
            body["token"].as_str().unwrap().to_string()
        }

        /// Sign in as the seeded administrator.
        pub async fn admin(&self) -> String {
            self.login("admin", "1234").await
        }
    }
}
