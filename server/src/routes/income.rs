//! Income records.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use autobook_engine::{find_matching_bookings, Booking, IncomeDraft, IncomeRecord, Matches};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::auth::{AdminUser, AuthUser};
use crate::error::{AppError, Result};
use crate::AppState;

/// Optional list filters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncomeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub executor: Option<String>,
}

impl IncomeQuery {
    fn accepts(&self, record: &IncomeRecord) -> bool {
        self.start.map_or(true, |start| record.date >= start)
            && self.end.map_or(true, |end| record.date <= end)
            && self.executor.as_ref().map_or(true, |id| {
                record.executors.contains(id) || record.shares.contains_key(id)
            })
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/income", get(list).post(create))
        .route("/income/{id}", get(show).put(update).delete(remove))
        .route("/income/{id}/bookings", get(matching_bookings))
}

async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<IncomeQuery>,
) -> Json<Vec<IncomeRecord>> {
    let records = state.ledger.list::<IncomeRecord>();
    Json(records.into_iter().filter(|r| query.accepts(r)).collect())
}

async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(draft): Json<IncomeDraft>,
) -> Result<(StatusCode, Json<IncomeRecord>)> {
    let record = state.ledger.create::<IncomeRecord>(draft, Utc::now())?;
    tracing::info!(id = %record.id, amount = record.amount, "Income record created");
    Ok((StatusCode::CREATED, Json(record)))
}

fn find(state: &AppState, id: &str) -> Result<IncomeRecord> {
    state
        .ledger
        .get::<IncomeRecord>(id)
        .ok_or_else(|| AppError::NotFound(format!("income record {id}")))
}

async fn show(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<IncomeRecord>> {
    Ok(Json(find(&state, &id)?))
}

async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(draft): Json<IncomeDraft>,
) -> Result<Json<IncomeRecord>> {
    Ok(Json(state.ledger.update::<IncomeRecord>(&id, draft, Utc::now())?))
}

async fn remove(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.ledger.delete::<IncomeRecord>(&id)?;
    tracing::info!(id = %id, "Income record deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Bookings made by the same client as this income record.
async fn matching_bookings(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Matches<Booking>>> {
    let record = find(&state, &id)?;
    let bookings = state.ledger.list::<Booking>();
    let matches = find_matching_bookings(&bookings, &record.client);
    Ok(Json(Matches::from_refs(matches)))
}
