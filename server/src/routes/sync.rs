//! Manual synchronization with the remote store.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use autobook_engine::CollectionKind;
use futures::future::join_all;
use serde::Serialize;

use super::{collection_kind, Confirmation};
use crate::auth::{AdminUser, AuthUser};
use crate::error::Result;
use crate::sync::{LoadSummary, SyncStatus};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionCount {
    pub collection: CollectionKind,
    pub count: usize,
}

/// Outcome of saving one collection as part of a bulk save.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResult {
    pub collection: CollectionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResponse {
    pub ok: bool,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sync/save", post(save_all))
        .route("/sync/save/{collection}", post(save))
        .route("/sync/load/{collection}", post(load))
        .route("/sync/refresh", post(refresh))
        .route("/sync/probe", get(probe))
        .route("/sync/status", get(status))
}

async fn save(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(collection): Path<String>,
) -> Result<Json<CollectionCount>> {
    let kind = collection_kind(&collection)?;
    let count = state.sync.save_to_cloud(kind).await?;
    Ok(Json(CollectionCount {
        collection: kind,
        count,
    }))
}

/// Save every collection; one failure does not stop the others.
async fn save_all(State(state): State<AppState>, _admin: AdminUser) -> Json<Vec<SaveResult>> {
    let results = join_all(CollectionKind::ALL.map(|kind| {
        let sync = state.sync.clone();
        async move {
            match sync.save_to_cloud(kind).await {
                Ok(count) => SaveResult {
                    collection: kind,
                    count: Some(count),
                    error: None,
                },
                Err(e) => SaveResult {
                    collection: kind,
                    count: None,
                    error: Some(e.to_string()),
                },
            }
        }
    }))
    .await;
    Json(results)
}

/// Replace a local collection with the remote one.
async fn load(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(collection): Path<String>,
    Json(confirmation): Json<Confirmation>,
) -> Result<Json<CollectionCount>> {
    let kind = collection_kind(&collection)?;
    confirmation.require()?;
    let count = state.sync.replace_from_cloud(kind).await?;
    Ok(Json(CollectionCount {
        collection: kind,
        count,
    }))
}

/// Merge the remote record collections again.
async fn refresh(State(state): State<AppState>, _admin: AdminUser) -> Json<LoadSummary> {
    Json(state.sync.load_from_cloud(true).await)
}

async fn probe(State(state): State<AppState>, _admin: AdminUser) -> Json<ProbeResponse> {
    let outcome = state.sync.probe().await;
    Json(ProbeResponse {
        ok: outcome.is_ok(),
        url: state.config.remote_store_url.clone(),
        status: outcome.status(),
        hint: outcome.hint(),
    })
}

async fn status(State(state): State<AppState>, _user: AuthUser) -> Json<SyncStatus> {
    Json(state.sync.status())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn save_and_load_collection() {
        let app = TestApp::new(
            "localhost",
            json!({"TEST": {"Bookings": {
                "a": {"id": "b1", "clientName": "Анна", "date": "2024-05-01", "createdAt": "2024-05-01T08:00:00.000Z"}
            }}}),
        )
        .await;
        let admin = app.admin().await;

        let (status, saved) = app
            .request(Method::POST, "/sync/save/users", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved, json!({"collection": "users", "count": 1}));
        assert_eq!(app.remote.tree()["TEST"]["Users"][0]["username"], "admin");

        let (status, _) = app
            .request(
                Method::POST,
                "/sync/load/bookings",
                Some(&admin),
                Some(json!({})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, loaded) = app
            .request(
                Method::POST,
                "/sync/load/Bookings",
                Some(&admin),
                Some(json!({"confirm": true})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{loaded}");
        assert_eq!(loaded["count"], 1);
        assert_eq!(
            app.state.ledger.list::<autobook_engine::Booking>()[0].id,
            "b1"
        );

        let (status, _) = app
            .request(Method::POST, "/sync/save/invoices", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn remote_failures_carry_hints() {
        let app = TestApp::new("shop.example.com", json!(null)).await;
        let admin = app.admin().await;
        app.remote
            .respond_with(Some(axum::http::StatusCode::NOT_FOUND));

        let (status, body) = app
            .request(Method::POST, "/sync/save/prices", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["details"]
            .as_str()
            .unwrap()
            .contains("Create the Realtime Database"));

        let (status, probe) = app.request(Method::GET, "/sync/probe", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(probe["ok"], false);
        assert_eq!(probe["status"], 404);

        app.remote
            .respond_with(Some(axum::http::StatusCode::UNAUTHORIZED));
        let (status, body) = app
            .request(Method::POST, "/sync/save/prices", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["details"].as_str().unwrap().contains("Rules"));

        let (_, results) = app.request(Method::POST, "/sync/save", Some(&admin), None).await;
        assert_eq!(results.as_array().unwrap().len(), 4);
        assert!(results[0]["error"].is_string());
    }

    #[tokio::test]
    async fn refresh_and_status() {
        let app = TestApp::new(
            "shop.example.com",
            json!({"MASTER": {"Income": [
                {"id": "r1", "amount": "900", "date": "2024-05-01", "workType": "engine",
                 "executors": ["u1"], "createdAt": "2024-05-01T08:00:00.000Z"}
            ]}}),
        )
        .await;
        let admin = app.admin().await;

        let (status, summary) = app
            .request(Method::POST, "/sync/refresh", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["skipped"], false);
        assert_eq!(summary["collections"][0]["collection"], "income");
        assert_eq!(app.state.ledger.list::<autobook_engine::IncomeRecord>().len(), 1);

        let (_, status) = app.request(Method::GET, "/sync/status", Some(&admin), None).await;
        assert_eq!(status["branch"], "MASTER");
        assert_eq!(status["loaded"], true);
        assert_eq!(status["autoPush"], true);
        assert!(status["lastSync"].is_string());
    }
}
