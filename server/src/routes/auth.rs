//! Sign-in and sign-out.

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use autobook_engine::{authenticate, Principal, User};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Principal,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let users = state.ledger.list::<User>();
    let principal =
        authenticate(&users, request.username.trim(), &request.password).ok_or_else(|| {
            tracing::info!(username = %request.username, "Rejected sign-in");
            AppError::Unauthorized
        })?;

    let session = state.sessions.login(principal.clone())?;
    state.sync.set_authenticated(true);
    tracing::info!(user = %principal.username, first = session.first, "Signed in");

    // Pull the remote collections until one load has fully succeeded.
    if !state.sync.is_loaded() {
        let sync = state.sync.clone();
        tokio::spawn(async move {
            sync.load_from_cloud(false).await;
        });
    }

    Ok(Json(LoginResponse {
        token: session.token,
        user: principal,
    }))
}

async fn logout(State(state): State<AppState>, user: AuthUser) -> Result<StatusCode> {
    if state.sessions.logout(&user.token)? == Some(true) {
        tracing::info!("Last session closed");
        state.sync.set_authenticated(false);
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn me(user: AuthUser) -> Json<Principal> {
    Json(user.principal)
}
