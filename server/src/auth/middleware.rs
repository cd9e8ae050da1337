//! Request extractors for signed-in users.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use autobook_engine::Principal;

use crate::error::AppError;
use crate::AppState;

/// A signed-in user, any role.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub token: String,
    pub principal: Principal,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthorized)?;

        let principal = state.sessions.get(token).ok_or(AppError::Unauthorized)?;
        Ok(AuthUser {
            token: token.to_string(),
            principal,
        })
    }
}

/// A signed-in administrator.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.principal.is_admin() {
            tracing::debug!(user = %user.principal.username, "Administrator role required");
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}
