// PDF export: capture the rendered document, assemble the PDF, and walk the
// size budget until the output fits or the forced pass has run.

pub mod pdf;
pub mod raster;
pub mod retry;

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::render::RenderedDocument;

pub use pdf::assemble_pdf;
pub use raster::{LayoutRasterizer, Rasterizer};
pub use retry::{next_step, on_canvas_overflow, ExportAttempt, Step, MAX_PASSES};

#[derive(Debug, Clone)]
pub struct ExportedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// Rasterizations performed, at most `retry::MAX_PASSES`.
    pub passes: u8,
    pub final_attempt: ExportAttempt,
    pub within_limit: bool,
}

/// An exported PDF sent as a download.
pub struct PdfDownload {
    pub file_name: String,
    pub pdf: ExportedPdf,
}

/// `attachment` disposition with an ASCII fallback name and the exact name
/// percent-encoded as UTF-8.
pub fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let encoded: String = file_name
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-') {
                (b as char).to_string()
            } else {
                format!("%{b:02X}")
            }
        })
        .collect();
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

impl IntoResponse for PdfDownload {
    fn into_response(self) -> Response {
        let disposition = HeaderValue::from_str(&content_disposition(&self.file_name))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
        (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
                (header::CONTENT_DISPOSITION, disposition),
                (
                    header::HeaderName::from_static("x-export-passes"),
                    HeaderValue::from(u16::from(self.pdf.passes)),
                ),
                (
                    header::HeaderName::from_static("x-export-within-limit"),
                    HeaderValue::from_static(if self.pdf.within_limit { "true" } else { "false" }),
                ),
                (
                    header::HeaderName::from_static("x-export-pages"),
                    HeaderValue::from(self.pdf.page_count),
                ),
                (
                    header::HeaderName::from_static("x-export-quality"),
                    HeaderValue::from(u16::from(self.pdf.final_attempt.jpeg_quality())),
                ),
            ],
            self.pdf.bytes,
        )
            .into_response()
    }
}

/// Exports `doc` to a PDF no larger than `limit` bytes when that is reachable.
///
/// When even the forced minimum pass is too large its output is returned
/// anyway with `within_limit == false`.
pub async fn export_pdf(
    rasterizer: &dyn Rasterizer,
    doc: &RenderedDocument,
    limit: usize,
) -> Result<ExportedPdf, AppError> {
    let mut attempt = ExportAttempt::initial();
    let mut passes = 0u8;

    loop {
        passes += 1;
        let capture = match rasterizer.capture(doc, attempt.scale).await {
            Ok(capture) => capture,
            Err(AppError::CanvasTooTall { height, limit }) => match on_canvas_overflow(&attempt) {
                Some(next) => {
                    warn!(
                        "Canvas {height}px over {limit}px at scale {:.1}; retrying at minimum scale",
                        attempt.scale
                    );
                    attempt = next;
                    continue;
                }
                None => return Err(AppError::CanvasTooTall { height, limit }),
            },
            Err(e) => return Err(e),
        };
        let quality = attempt.jpeg_quality();
        let mode = attempt.mode;
        let assembled = tokio::task::spawn_blocking(move || assemble_pdf(&capture, quality, mode))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF assembly task failed: {e}")))??;

        let size = assembled.bytes.len();
        debug!(
            "Export pass {passes}/{MAX_PASSES}: scale {:.1}, quality {quality}, {:?} -> {size} bytes",
            attempt.scale, mode
        );

        let within_limit = match next_step(&attempt, size, limit) {
            Step::Accept => true,
            Step::AcceptOversized => {
                warn!("Export still {size} bytes after {passes} passes (limit {limit}); keeping it");
                false
            }
            Step::Retry(next) | Step::ForceMinimum(next) => {
                attempt = next;
                continue;
            }
        };

        return Ok(ExportedPdf {
            bytes: assembled.bytes,
            page_count: assembled.page_count,
            passes,
            final_attempt: attempt,
            within_limit,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::{CvRecord, PersonalInfo};
    use crate::models::user::Locale;
    use crate::render::{render_cv, TemplateId};

    fn doc() -> RenderedDocument {
        let mut cv = CvRecord::new_editor();
        cv.personal_info = Some(PersonalInfo {
            first_name: "Marie".into(),
            last_name: "Abdou".into(),
            email: "marie.abdou@email.com".into(),
            ..Default::default()
        });
        render_cv(&cv, TemplateId::Creatif, Locale::Fr)
    }

    #[tokio::test]
    async fn test_generous_limit_takes_one_pass() {
        let out = export_pdf(&LayoutRasterizer, &doc(), 50 * 1024 * 1024)
            .await
            .unwrap();
        assert_eq!(out.passes, 1);
        assert!(out.within_limit);
        assert_eq!(out.final_attempt, ExportAttempt::initial());
        assert!(out.bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_unreachable_limit_stops_after_forced_pass() {
        let out = export_pdf(&LayoutRasterizer, &doc(), 1).await.unwrap();
        assert_eq!(out.passes, MAX_PASSES);
        assert!(!out.within_limit);
        assert!(out.final_attempt.forced);
        assert!(!out.bytes.is_empty());
    }

    #[test]
    fn test_content_disposition_keeps_accents_encoded() {
        assert_eq!(
            content_disposition("Lettre_Société_Chef.pdf"),
            "attachment; filename=\"Lettre_Soci_t__Chef.pdf\"; \
             filename*=UTF-8''Lettre_Soci%C3%A9t%C3%A9_Chef.pdf"
        );
    }

    /// Refuses every scale above the minimum, like a very long document would.
    struct TallAboveMinimum;

    #[async_trait::async_trait]
    impl Rasterizer for TallAboveMinimum {
        async fn capture(
            &self,
            doc: &RenderedDocument,
            scale: f32,
        ) -> Result<raster::Capture, AppError> {
            if scale > retry::MIN_SCALE {
                return Err(AppError::CanvasTooTall {
                    height: 90_000,
                    limit: 60_000,
                });
            }
            LayoutRasterizer.capture(doc, scale).await
        }
    }

    #[tokio::test]
    async fn test_tall_canvas_falls_back_to_minimum_scale() {
        let out = export_pdf(&TallAboveMinimum, &doc(), 50 * 1024 * 1024)
            .await
            .unwrap();
        assert_eq!(out.passes, 2);
        assert!(out.final_attempt.forced);
        assert_eq!(out.final_attempt.scale, retry::MIN_SCALE);
        assert!(out.within_limit);
        assert!(out.page_count >= 1);
    }

    #[tokio::test]
    async fn test_blank_document_fails_without_retrying() {
        let blank = RenderedDocument {
            header: None,
            sidebar: Vec::new(),
            main: Vec::new(),
            ..doc()
        };
        let err = export_pdf(&LayoutRasterizer, &blank, 1).await.unwrap_err();
        assert!(matches!(err, AppError::RenderCapture(_)));
    }
}
