// CV import: uploaded file -> plain text -> structured fields for review.
// Nothing touches the stored CV until the reviewed data is confirmed.

pub mod handlers;
pub mod parser;
pub mod text;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::cv::{CvRecord, ExtractedCvData};
use crate::storage::Repository;

pub use parser::parse_cv_text;
pub use text::{NativeTextExtractor, TextExtractor, UploadedFile};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionPreview {
    pub file_name: Option<String>,
    pub data: ExtractedCvData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionConfirmRequest {
    pub data: ExtractedCvData,
}

/// Validates the upload, extracts its text and parses it.
pub async fn extract_preview(
    extractor: &dyn TextExtractor,
    file: UploadedFile,
    max_bytes: usize,
) -> Result<ExtractionPreview, AppError> {
    let format = file.validate(max_bytes)?;
    let text = extractor.extract(format, file.bytes.clone()).await?;
    let data = parse_cv_text(&text);
    info!(
        "Parsed {:?} upload: {} experience, {} education, {} skills, {} languages",
        format,
        data.experience.len(),
        data.education.len(),
        data.skills.len(),
        data.languages.len()
    );
    Ok(ExtractionPreview {
        file_name: file.file_name,
        data,
    })
}

/// Writes user-reviewed extraction output into the CV record.
pub async fn confirm_extraction(
    repo: &Repository,
    data: ExtractedCvData,
) -> Result<CvRecord, AppError> {
    repo.update_cv(move |cv| {
        cv.apply_extracted(data);
        Ok(())
    })
    .await
}
