use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};

use crate::errors::AppError;
use crate::extraction::{
    confirm_extraction, extract_preview, ExtractionConfirmRequest, ExtractionPreview, UploadedFile,
};
use crate::models::cv::CvRecord;
use crate::state::AppState;

fn multipart_error(e: MultipartError, limit: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        // the body limit tripped, so the file is at least this big
        AppError::OversizedFile {
            size: limit.saturating_add(1),
            limit,
        }
    } else {
        AppError::Validation(format!("Invalid upload: {}", e.body_text()))
    }
}

/// POST /api/v1/cv/extract
///
/// Multipart with a single `file` field. Returns the parsed fields for review;
/// the stored CV is not modified.
pub async fn handle_extract(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractionPreview>, AppError> {
    let limit = state.config.max_upload_bytes;
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        upload = Some(UploadedFile {
            file_name,
            content_type,
            bytes,
        });
        break;
    }

    let upload =
        upload.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;
    let preview = extract_preview(state.extractor.as_ref(), upload, limit).await?;
    Ok(Json(preview))
}

/// POST /api/v1/cv/extract/confirm
pub async fn handle_extract_confirm(
    State(state): State<AppState>,
    Json(req): Json<ExtractionConfirmRequest>,
) -> Result<Json<CvRecord>, AppError> {
    let cv = confirm_extraction(&state.repo, req.data).await?;
    Ok(Json(cv))
}
