//! The price list.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use autobook_engine::{PriceDraft, PriceEntry};
use chrono::Utc;
use serde::Serialize;

use crate::auth::{AdminUser, AuthUser};
use crate::error::{AppError, Result};
use crate::AppState;

/// A price entry with its display form.
#[derive(Debug, Serialize)]
pub struct PriceView {
    #[serde(flatten)]
    pub entry: PriceEntry,
    pub formatted: String,
}

impl From<PriceEntry> for PriceView {
    fn from(entry: PriceEntry) -> Self {
        Self {
            formatted: entry.formatted_price(),
            entry,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/prices", get(list).post(create))
        .route("/prices/{id}", get(show).put(update).delete(remove))
}

async fn list(State(state): State<AppState>, _user: AuthUser) -> Json<Vec<PriceView>> {
    Json(
        state
            .ledger
            .list::<PriceEntry>()
            .into_iter()
            .map(PriceView::from)
            .collect(),
    )
}

async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(draft): Json<PriceDraft>,
) -> Result<(StatusCode, Json<PriceView>)> {
    let entry = state.ledger.create::<PriceEntry>(draft, Utc::now())?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

async fn show(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PriceView>> {
    state
        .ledger
        .get::<PriceEntry>(&id)
        .map(|entry| Json(entry.into()))
        .ok_or_else(|| AppError::NotFound(format!("price {id}")))
}

async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(draft): Json<PriceDraft>,
) -> Result<Json<PriceView>> {
    let entry = state.ledger.update::<PriceEntry>(&id, draft, Utc::now())?;
    Ok(Json(entry.into()))
}

async fn remove(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.ledger.delete::<PriceEntry>(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
