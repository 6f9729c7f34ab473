use axum::{extract::State, Json};
use chrono::Utc;

use crate::errors::AppError;
use crate::models::user::AppPreferences;
use crate::state::AppState;

/// GET /api/v1/preferences
pub async fn handle_get_preferences(
    State(state): State<AppState>,
) -> Result<Json<AppPreferences>, AppError> {
    Ok(Json(state.repo.load_preferences().await?))
}

/// PUT /api/v1/preferences
/// Stamps `lastVisit` on every save.
pub async fn handle_put_preferences(
    State(state): State<AppState>,
    Json(mut prefs): Json<AppPreferences>,
) -> Result<Json<AppPreferences>, AppError> {
    prefs.last_visit = Some(Utc::now());
    state.repo.save_preferences(&prefs).await?;
    Ok(Json(prefs))
}
