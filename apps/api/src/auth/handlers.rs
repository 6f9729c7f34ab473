use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::auth::service;
use crate::auth::{LoginRequest, PasswordChange, ProfileUpdate, RegisterRequest};
use crate::errors::AppError;
use crate::models::user::{AuthState, User};
use crate::navigation::Location;
use crate::state::AppState;

/// The session plus where the client should go next.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[serde(flatten)]
    pub session: AuthState,
    pub redirect: String,
}

fn with_redirect(session: AuthState, location: Location) -> Json<SessionResponse> {
    Json(SessionResponse {
        session,
        redirect: location.to_fragment(),
    })
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let session = service::register(&state.repo, req).await?;
    let location = state.navigation.complete_login();
    Ok((StatusCode::CREATED, with_redirect(session, location)))
}

/// POST /api/v1/auth/login
/// Sends the user back to the page that required the login, else the dashboard.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = service::login(&state.repo, req).await?;
    let location = state.navigation.complete_login();
    Ok(with_redirect(session, location))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    service::logout(&state.repo).await?;
    state.navigation.reset();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/session
pub async fn handle_session(State(state): State<AppState>) -> Result<Json<AuthState>, AppError> {
    Ok(Json(state.repo.load_session().await?))
}

/// PATCH /api/v1/auth/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    Ok(Json(service::update_profile(&state.repo, update).await?))
}

/// POST /api/v1/auth/password
pub async fn handle_change_password(
    State(state): State<AppState>,
    Json(req): Json<PasswordChange>,
) -> Result<StatusCode, AppError> {
    service::change_password(&state.repo, req).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/reset
pub async fn handle_reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetRequest>,
) -> Result<StatusCode, AppError> {
    service::reset_password(&state.repo, &req.email).await?;
    Ok(StatusCode::ACCEPTED)
}

/// DELETE /api/v1/auth/account
pub async fn handle_delete_account(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    // pending autosave writes would resurrect the CV after the purge
    state.autosave.flush().await?;
    service::delete_account(&state.repo).await?;
    state.navigation.reset();
    Ok(StatusCode::NO_CONTENT)
}
