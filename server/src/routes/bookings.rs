//! Bookings and the links from a booking to income.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use autobook_engine::{
    find_matching_records, Booking, BookingDraft, IncomeDraft, IncomeRecord, Matches,
};
use chrono::Utc;

use crate::auth::{AdminUser, AuthUser};
use crate::error::{AppError, Result};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list).post(create))
        .route("/bookings/{id}", get(show).put(update).delete(remove))
        .route("/bookings/{id}/income", get(matching_income))
        .route("/bookings/{id}/income-draft", get(income_draft))
}

fn find(state: &AppState, id: &str) -> Result<Booking> {
    state
        .ledger
        .get::<Booking>(id)
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}

async fn list(State(state): State<AppState>, _user: AuthUser) -> Json<Vec<Booking>> {
    Json(state.ledger.list::<Booking>())
}

async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(draft): Json<BookingDraft>,
) -> Result<(StatusCode, Json<Booking>)> {
    let booking = state.ledger.create::<Booking>(draft, Utc::now())?;
    tracing::info!(id = %booking.id, date = %booking.date, "Booking created");
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn show(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Booking>> {
    Ok(Json(find(&state, &id)?))
}

async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(draft): Json<BookingDraft>,
) -> Result<Json<Booking>> {
    let booking = state.ledger.update::<Booking>(&id, draft, Utc::now())?;
    tracing::info!(id = %booking.id, status = %booking.status, "Booking updated");
    Ok(Json(booking))
}

async fn remove(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.ledger.delete::<Booking>(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Income records from the same client as this booking.
async fn matching_income(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Matches<IncomeRecord>>> {
    let booking = find(&state, &id)?;
    let records = state.ledger.list::<IncomeRecord>();
    let matches = find_matching_records(&records, &booking.client_name, &booking.client_phone);
    Ok(Json(Matches::from_refs(matches)))
}

/// A prefilled income draft for a finished booking.
async fn income_draft(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<IncomeDraft>> {
    let booking = find(&state, &id)?;
    booking
        .income_template()
        .map(Json)
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "booking {id} is {}, only done bookings become income",
                booking.status
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn done_booking_prefills_income() {
        let app = TestApp::new("localhost", json!(null)).await;
        let admin = app.admin().await;

        let (status, booking) = app
            .request(
                Method::POST,
                "/bookings",
                Some(&admin),
                Some(json!({
                    "clientName": "Анна",
                    "clientPhone": "8-900-000-00-01",
                    "carBrand": "Kia Rio",
                    "date": "2024-05-03",
                    "time": "10:30",
                    "description": "замена колодок"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(booking["status"], "pending");
        let id = booking["id"].as_str().unwrap().to_string();

        let uri = format!("/bookings/{id}/income-draft");
        let (status, _) = app.request(Method::GET, &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, updated) = app
            .request(
                Method::PUT,
                &format!("/bookings/{id}"),
                Some(&admin),
                Some(json!({
                    "clientName": "Анна",
                    "clientPhone": "8-900-000-00-01",
                    "carBrand": "Kia Rio",
                    "date": "2024-05-03",
                    "description": "замена колодок",
                    "status": "done"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{updated}");

        let (status, draft) = app.request(Method::GET, &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(draft["carBrand"], "Kia Rio");
        assert_eq!(draft["comment"], "замена колодок");
        assert_eq!(draft["client"]["name"], "Анна");
        assert_eq!(draft["date"], "2024-05-03");

        // The booking is untouched by drafting.
        let (_, booking) = app
            .request(Method::GET, &format!("/bookings/{id}"), Some(&admin), None)
            .await;
        assert_eq!(booking["status"], "done");
    }

    #[tokio::test]
    async fn matching_income_for_booking() {
        let app = TestApp::new("localhost", json!(null)).await;
        let admin = app.admin().await;

        let (_, booking) = app
            .request(
                Method::POST,
                "/bookings",
                Some(&admin),
                Some(json!({"clientPhone": "+7 900 000 00 02", "date": "2024-05-03"})),
            )
            .await;
        let (status, _) = app
            .request(
                Method::POST,
                "/income",
                Some(&admin),
                Some(json!({
                    "amount": 700,
                    "date": "2024-05-04",
                    "workType": "brakes",
                    "executors": ["u1"],
                    "client": {"name": "Олег", "phone": "79000000002"}
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let uri = format!("/bookings/{}/income", booking["id"].as_str().unwrap());
        let (_, matches) = app.request(Method::GET, &uri, Some(&admin), None).await;
        assert_eq!(matches["count"], 1);
        assert_eq!(matches["first"]["amount"], 700.0);

        let (status, _) = app
            .request(Method::GET, "/bookings/missing/income", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
