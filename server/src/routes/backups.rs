//! Backups of the production branch. Administrators only.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use autobook_engine::{BackupSnapshot, DueReason};
use chrono::{Local, Utc};
use serde::Serialize;

use super::{collection_kind, Confirmation};
use crate::auth::AdminUser;
use crate::backup::BackupOutcome;
use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupList {
    pub keys: Vec<String>,
    pub last_backup: Option<chrono::DateTime<Utc>>,
    /// Why the scheduler would take a backup now, if it would.
    pub due: Option<DueReason>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreResponse {
    pub key: String,
    pub collection: autobook_engine::CollectionKind,
    pub count: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/backups", get(list))
        .route("/backups/run", post(run))
        .route("/backups/{key}", get(show))
        .route("/backups/{key}/restore", post(restore))
}

async fn list(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<BackupList>> {
    Ok(Json(BackupList {
        keys: state.backups.list_backups().await?,
        last_backup: state.backups.last_backup(),
        due: state.backups.due_reason(Local::now()),
    }))
}

async fn run(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<BackupOutcome>> {
    Ok(Json(state.backups.run_backup(Utc::now()).await?))
}

async fn show(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(key): Path<String>,
) -> Result<Json<BackupSnapshot>> {
    Ok(Json(state.backups.restore(&key).await?))
}

async fn restore(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(key): Path<String>,
    Json(confirmation): Json<Confirmation>,
) -> Result<Json<RestoreResponse>> {
    let raw = confirmation
        .collection
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("collection is required".into()))?;
    let kind = collection_kind(raw)?;
    confirmation.require()?;

    let count = state.backups.restore_collection(&key, kind).await?;
    Ok(Json(RestoreResponse {
        key,
        collection: kind,
        count,
    }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    fn production() -> serde_json::Value {
        json!({
            "MASTER": {"Prices": [
                {"id": "p1", "workType": "engine", "price": "100", "createdAt": "2024-01-01T00:00:00.000Z"}
            ]},
            "BACKUP": {
                "2024-06-30": {"timestamp": "2024-06-30T01:00:00.000Z", "data": {"Prices": [
                    {"id": "old", "workType": "engine", "price": "90", "createdAt": "2023-12-01T00:00:00.000Z"}
                ]}}
            }
        })
    }

    #[tokio::test]
    async fn run_list_and_restore() {
        let app = TestApp::new("shop.example.com", production()).await;
        let admin = app.admin().await;

        let (status, outcome) = app.request(Method::POST, "/backups/run", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["status"], "completed");
        let key = outcome["key"].as_str().unwrap().to_string();

        let (_, list) = app.request(Method::GET, "/backups", Some(&admin), None).await;
        assert_eq!(list["keys"], json!([key, "2024-06-30"]));
        assert!(list["lastBackup"].is_string());
        assert!(list["due"].is_null());

        let (status, snapshot) = app
            .request(Method::GET, "/backups/latest", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["data"]["Prices"][0]["id"], "p1");

        let (status, _) = app
            .request(
                Method::POST,
                "/backups/2024-06-30/restore",
                Some(&admin),
                Some(json!({"collection": "prices"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, restored) = app
            .request(
                Method::POST,
                "/backups/2024-06-30/restore",
                Some(&admin),
                Some(json!({"collection": "prices", "confirm": true})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{restored}");
        assert_eq!(restored["count"], 1);
        let prices = app.state.ledger.list::<autobook_engine::PriceEntry>();
        assert_eq!(prices[0].id, "old");
    }

    #[tokio::test]
    async fn test_branch_never_backs_up() {
        let app = TestApp::new("localhost", production()).await;
        let admin = app.admin().await;
        let (_, outcome) = app.request(Method::POST, "/backups/run", Some(&admin), None).await;
        assert_eq!(outcome, json!({"status": "skipped", "reason": "notProduction"}));
    }
}
