use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cv::editor::{add_entry, remove_entry, validate_step, StepReport};
use crate::cv::{export_cv, preview_cv, resolve_template};
use crate::errors::AppError;
use crate::export::PdfDownload;
use crate::models::cv::{CvPatch, CvRecord, CvSection};
use crate::render::{catalog, templates::TemplateInfo, TemplateId};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TemplateQuery {
    pub template: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TemplateSelection {
    pub template: TemplateId,
}

#[derive(Debug, Serialize)]
pub struct EntryCreated {
    pub id: Uuid,
    pub cv: CvRecord,
}

fn parse_section(raw: &str) -> Result<CvSection, AppError> {
    CvSection::parse(raw).ok_or_else(|| AppError::NotFound(format!("Unknown CV section '{raw}'")))
}

/// Loads the CV after writing any pending draft, so reads see the latest edits.
async fn current_cv(state: &AppState) -> Result<CvRecord, AppError> {
    state.autosave.flush().await?;
    state.repo.load_or_create_cv().await
}

/// GET /api/v1/cv
pub async fn handle_get_cv(State(state): State<AppState>) -> Result<Json<CvRecord>, AppError> {
    Ok(Json(current_cv(&state).await?))
}

/// PUT /api/v1/cv
/// Saves the parts present in the body right away.
pub async fn handle_save_cv(
    State(state): State<AppState>,
    Json(patch): Json<CvPatch>,
) -> Result<Json<CvRecord>, AppError> {
    state.autosave.flush().await?;
    Ok(Json(state.repo.apply_patch(patch).await?))
}

/// PUT /api/v1/cv/draft
/// Queues the parts for the debounced autosave.
pub async fn handle_stage_draft(
    State(state): State<AppState>,
    Json(patch): Json<CvPatch>,
) -> Result<StatusCode, AppError> {
    state.autosave.stage(patch)?;
    Ok(StatusCode::ACCEPTED)
}

/// POST /api/v1/cv/draft/flush
pub async fn handle_flush_draft(
    State(state): State<AppState>,
) -> Result<Json<CvRecord>, AppError> {
    Ok(Json(current_cv(&state).await?))
}

/// POST /api/v1/cv/:section/entries
pub async fn handle_add_entry(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> Result<(StatusCode, Json<EntryCreated>), AppError> {
    let section = parse_section(&section)?;
    state.autosave.flush().await?;
    let mut id = Uuid::nil();
    let cv = state
        .repo
        .update_cv(|cv| {
            id = add_entry(cv, section);
            Ok(())
        })
        .await?;
    Ok((StatusCode::CREATED, Json(EntryCreated { id, cv })))
}

/// DELETE /api/v1/cv/:section/entries/:id
pub async fn handle_remove_entry(
    State(state): State<AppState>,
    Path((section, id)): Path<(String, Uuid)>,
) -> Result<Json<CvRecord>, AppError> {
    let section = parse_section(&section)?;
    state.autosave.flush().await?;
    let cv = state
        .repo
        .update_cv(|cv| remove_entry(cv, section, id))
        .await?;
    Ok(Json(cv))
}

/// GET /api/v1/cv/steps/:step
pub async fn handle_validate_step(
    State(state): State<AppState>,
    Path(step): Path<u8>,
) -> Result<Json<StepReport>, AppError> {
    let cv = current_cv(&state).await?;
    Ok(Json(validate_step(&cv, step)?))
}

/// PUT /api/v1/cv/template
pub async fn handle_select_template(
    State(state): State<AppState>,
    Json(req): Json<TemplateSelection>,
) -> Result<Json<CvRecord>, AppError> {
    state.autosave.flush().await?;
    let cv = state
        .repo
        .update_cv(|cv| {
            cv.selected_template = Some(req.template);
            Ok(())
        })
        .await?;
    Ok(Json(cv))
}

/// GET /api/v1/templates
pub async fn handle_list_templates() -> Json<Vec<TemplateInfo>> {
    Json(catalog())
}

/// GET /api/v1/cv/preview?template=
pub async fn handle_preview(
    State(state): State<AppState>,
    Query(query): Query<TemplateQuery>,
) -> Result<Html<String>, AppError> {
    let cv = current_cv(&state).await?;
    let locale = state.repo.load_preferences().await?.language;
    let template = resolve_template(&cv, query.template.as_deref());
    Ok(Html(preview_cv(&cv, template, locale)?))
}

/// POST /api/v1/cv/export?template=
pub async fn handle_export(
    State(state): State<AppState>,
    Query(query): Query<TemplateQuery>,
) -> Result<PdfDownload, AppError> {
    let cv = current_cv(&state).await?;
    let locale = state.repo.load_preferences().await?.language;
    let template = resolve_template(&cv, query.template.as_deref());
    let pdf = export_cv(
        state.rasterizer.as_ref(),
        &cv,
        template,
        locale,
        state.config.export_max_bytes,
    )
    .await?;
    Ok(PdfDownload {
        file_name: cv.export_file_name(),
        pdf,
    })
}
