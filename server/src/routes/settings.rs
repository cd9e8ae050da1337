//! Display preferences. Stored locally, never synchronized.

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::AppState;

const THEME_KEY: &str = "autoservice-theme";
const LANGUAGE_KEY: &str = "autoservice-language";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ru,
    /// Georgian
    Ge,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub theme: Theme,
    pub language: Language,
}

/// Partial update; absent fields keep their value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SettingsUpdate {
    pub theme: Option<Theme>,
    pub language: Option<Language>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/settings", get(show).put(update))
}

fn current(state: &AppState) -> Settings {
    let store = state.ledger.store();
    Settings {
        theme: store.get(THEME_KEY).unwrap_or_default(),
        language: store.get(LANGUAGE_KEY).unwrap_or_default(),
    }
}

async fn show(State(state): State<AppState>, _user: AuthUser) -> Json<Settings> {
    Json(current(&state))
}

async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<Settings>> {
    let store = state.ledger.store();
    if let Some(theme) = update.theme {
        store.set(THEME_KEY, &theme)?;
    }
    if let Some(language) = update.language {
        store.set(LANGUAGE_KEY, &language)?;
    }
    Ok(Json(current(&state)))
}
