//! Staff accounts. Administrators only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use autobook_engine::{User, UserDraft};
use chrono::Utc;

use crate::auth::AdminUser;
use crate::error::Result;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list).post(create))
        .route("/users/{id}", put(update).delete(remove))
}

async fn list(State(state): State<AppState>, _admin: AdminUser) -> Json<Vec<User>> {
    Json(state.ledger.list::<User>())
}

async fn create(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(draft): Json<UserDraft>,
) -> Result<(StatusCode, Json<User>)> {
    let user = state.ledger.create_user(draft, Utc::now())?;
    tracing::info!(
        by = %admin.principal.username,
        username = %user.username,
        role = ?user.role,
        "User created"
    );
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(draft): Json<UserDraft>,
) -> Result<Json<User>> {
    Ok(Json(state.ledger.update_user(&id, draft, Utc::now())?))
}

async fn remove(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let user = state.ledger.delete::<User>(&id)?;
    let revoked = state.sessions.revoke_user(&user.id)?;
    tracing::info!(
        by = %admin.principal.username,
        username = %user.username,
        signed_out = revoked.is_some(),
        "User deleted"
    );
    if revoked == Some(true) {
        tracing::info!("Last session revoked, automatic pushes paused");
        state.sync.set_authenticated(false);
    }
    Ok(StatusCode::NO_CONTENT)
}
