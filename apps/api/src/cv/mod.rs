// The CV builder: editor rules plus the preview and export entry points.

pub mod editor;
pub mod handlers;

use crate::errors::AppError;
use crate::export::{export_pdf, ExportedPdf, Rasterizer};
use crate::models::cv::CvRecord;
use crate::models::user::Locale;
use crate::render::{render_cv, to_html, TemplateId};

/// An explicit `?template=` wins over the CV's own choice; otherwise the default.
pub fn resolve_template(cv: &CvRecord, requested: Option<&str>) -> TemplateId {
    match requested {
        Some(raw) => TemplateId::resolve(raw),
        None => cv.selected_template.unwrap_or_default(),
    }
}

fn require_personal_info(cv: &CvRecord) -> Result<(), AppError> {
    if cv.personal_info.is_none() {
        return Err(AppError::MissingData(
            "Données CV manquantes: informations personnelles".to_string(),
        ));
    }
    Ok(())
}

pub fn preview_cv(cv: &CvRecord, template: TemplateId, locale: Locale) -> Result<String, AppError> {
    require_personal_info(cv)?;
    Ok(to_html(&render_cv(cv, template, locale)))
}

pub async fn export_cv(
    rasterizer: &dyn Rasterizer,
    cv: &CvRecord,
    template: TemplateId,
    locale: Locale,
    limit: usize,
) -> Result<ExportedPdf, AppError> {
    require_personal_info(cv)?;
    let doc = render_cv(cv, template, locale);
    export_pdf(rasterizer, &doc, limit).await
}
