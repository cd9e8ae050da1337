//! Text and table reports over the income records.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use autobook_engine::export::{full_report, monthly_report, period_report, report_table};
use autobook_engine::{IncomeRecord, ReportTable, TableOptions, User};
use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    #[default]
    Month,
    Full,
    Period,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TextQuery {
    pub kind: ReportKind,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/export/text", get(text))
        .route("/export/table", get(table))
}

async fn text(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<TextQuery>,
) -> Result<String> {
    let records = state.ledger.list::<IncomeRecord>();
    let users = state.ledger.list::<User>();
    let today = Local::now().date_naive();

    let report = match query.kind {
        ReportKind::Month => {
            let year = query.year.unwrap_or(today.year());
            let month = query.month.unwrap_or(today.month());
            if !(1..=12).contains(&month) {
                return Err(AppError::BadRequest(format!("invalid month {month}")));
            }
            monthly_report(&records, year, month, &users)
        }
        ReportKind::Full => full_report(&records, &users, today),
        ReportKind::Period => {
            let (Some(start), Some(end)) = (query.start, query.end) else {
                return Err(AppError::BadRequest(
                    "period reports need start and end dates".into(),
                ));
            };
            if start > end {
                return Err(AppError::BadRequest(format!(
                    "period starts after it ends: {start} > {end}"
                )));
            }
            period_report(&records, start, end, &users)
        }
    };
    Ok(report)
}

async fn table(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(options): Query<TableOptions>,
) -> Json<ReportTable> {
    let records = state.ledger.list::<IncomeRecord>();
    let users = state.ledger.list::<User>();
    Json(report_table(&records, &users, &options))
}
