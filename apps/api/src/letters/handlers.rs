use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Local;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::PdfDownload;
use crate::letters::{edit_letter, export_letter, find_letter, generate_letter, take_current_letter};
use crate::models::letter::{ApplicationDescriptor, LetterRecord};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LetterContentUpdate {
    pub content: String,
}

/// GET /api/v1/letters
pub async fn handle_list_letters(
    State(state): State<AppState>,
) -> Result<Json<Vec<LetterRecord>>, AppError> {
    Ok(Json(state.repo.list_letters().await?))
}

/// POST /api/v1/letters
pub async fn handle_generate_letter(
    State(state): State<AppState>,
    Json(descriptor): Json<ApplicationDescriptor>,
) -> Result<(StatusCode, Json<LetterRecord>), AppError> {
    // builder edits still in the debounce window belong in the snapshot
    state.autosave.flush().await?;
    let today = Local::now().date_naive();
    let letter = generate_letter(&state.repo, descriptor, today).await?;
    Ok((StatusCode::CREATED, Json(letter)))
}

/// GET /api/v1/letters/current
pub async fn handle_current_letter(
    State(state): State<AppState>,
) -> Result<Json<LetterRecord>, AppError> {
    take_current_letter(&state.repo)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No letter is waiting for preview".to_string()))
}

/// GET /api/v1/letters/:id
pub async fn handle_get_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LetterRecord>, AppError> {
    Ok(Json(find_letter(&state.repo, id).await?))
}

/// PUT /api/v1/letters/:id
pub async fn handle_update_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<LetterContentUpdate>,
) -> Result<Json<LetterRecord>, AppError> {
    Ok(Json(edit_letter(&state.repo, id, req.content).await?))
}

/// DELETE /api/v1/letters/:id
pub async fn handle_delete_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.repo.delete_letter(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Letter {id} not found")))
    }
}

/// POST /api/v1/letters/:id/export
pub async fn handle_export_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<PdfDownload, AppError> {
    let letter = find_letter(&state.repo, id).await?;
    let pdf = export_letter(
        state.rasterizer.as_ref(),
        &letter,
        state.config.export_max_bytes,
    )
    .await?;
    Ok(PdfDownload {
        file_name: letter.export_file_name(),
        pdf,
    })
}
