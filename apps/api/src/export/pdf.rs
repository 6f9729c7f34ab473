//! PDF assembly with `lopdf`.
//!
//! The capture is embedded once as a JPEG image and shown on every page,
//! shifted up by one 295 mm slice per page. Text runs from the layout are
//! drawn over it with the matching base-14 font so the export stays
//! selectable and searchable.

use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::errors::AppError;
use crate::export::raster::Capture;
use crate::export::retry::CompressionMode;
use crate::layout::{FontFamily, FontWeight, TextRun};

pub const A4_WIDTH_MM: f32 = 210.0;
/// Vertical distance between page slices.
pub const PAGE_SLICE_MM: f32 = 295.0;
pub const A4_WIDTH_PT: f32 = 595.28;
pub const A4_HEIGHT_PT: f32 = 841.89;
const PT_PER_MM: f32 = 72.0 / 25.4;

const FONTS: [(FontFamily, FontWeight, &str); 4] = [
    (FontFamily::Helvetica, FontWeight::Regular, "F1"),
    (FontFamily::Helvetica, FontWeight::Bold, "F2"),
    (FontFamily::Times, FontWeight::Regular, "F3"),
    (FontFamily::Times, FontWeight::Bold, "F4"),
];

#[derive(Debug, Clone)]
pub struct AssembledPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Number of A4 pages needed for an image `height_mm` tall at A4 width.
/// Half a millimetre of pixel rounding is tolerated before a new page starts.
pub fn page_count(height_mm: f32) -> usize {
    (((height_mm - 0.5) / PAGE_SLICE_MM).ceil() as usize).max(1)
}

/// Encodes text for a WinAnsi-encoded base font. Characters outside the
/// encoding become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            _ => match c {
                '€' => 0x80,
                '‚' => 0x82,
                '„' => 0x84,
                '…' => 0x85,
                'Œ' => 0x8C,
                '‘' => 0x91,
                '’' => 0x92,
                '“' => 0x93,
                '”' => 0x94,
                '•' => 0x95,
                '–' => 0x96,
                '—' => 0x97,
                'œ' => 0x9C,
                'Ÿ' => 0x9F,
                _ => b'?',
            },
        })
        .collect()
}

fn font_resource(font: FontFamily, weight: FontWeight) -> &'static str {
    FONTS
        .iter()
        .find(|(f, w, _)| *f == font && *w == weight)
        .map(|(_, _, name)| *name)
        .unwrap_or("F1")
}

fn real(v: f32) -> Object {
    Object::Real(v)
}

fn internal(e: lopdf::Error) -> AppError {
    AppError::Internal(anyhow::anyhow!("PDF assembly failed: {e}"))
}

/// Builds the PDF for one capture at the given JPEG quality.
pub fn assemble_pdf(
    capture: &Capture,
    jpeg_quality: u8,
    mode: CompressionMode,
) -> Result<AssembledPdf, AppError> {
    let (img_w, img_h) = capture.image.dimensions();
    if img_w == 0 || img_h == 0 {
        return Err(AppError::RenderCapture("empty capture".to_string()));
    }

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, jpeg_quality)
        .encode_image(&capture.image)
        .map_err(|e| AppError::RenderCapture(format!("JPEG encoding failed: {e}")))?;

    let image_height_mm = img_h as f32 * A4_WIDTH_MM / img_w as f32;
    let image_height_pt = image_height_mm * PT_PER_MM;
    let pages = page_count(image_height_mm);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(img_w),
                "Height" => i64::from(img_h),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            },
            jpeg,
        )
        .with_compression(false),
    );

    let mut font_dict = Dictionary::new();
    for (family, weight, name) in FONTS {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => family.base_font(weight),
            "Encoding" => "WinAnsiEncoding",
        });
        font_dict.set(name, font_id);
    }
    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! { "Im0" => image_id },
        "Font" => font_dict,
    });

    let mm_per_px = A4_WIDTH_MM / capture.scene.width;
    let mut page_runs: Vec<Vec<&TextRun>> = vec![Vec::new(); pages];
    for run in &capture.scene.text {
        let y_mm = run.y * mm_per_px;
        let page = (y_mm / PAGE_SLICE_MM).floor() as usize;
        if let Some(bucket) = page_runs.get_mut(page) {
            bucket.push(run);
        }
    }

    let mut kids: Vec<Object> = Vec::with_capacity(pages);
    for (k, runs) in page_runs.iter().enumerate() {
        let offset_mm = PAGE_SLICE_MM * k as f32;
        let mut operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    real(A4_WIDTH_PT),
                    real(0.0),
                    real(0.0),
                    real(image_height_pt),
                    real(0.0),
                    real(A4_HEIGHT_PT + offset_mm * PT_PER_MM - image_height_pt),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ];

        for run in runs {
            let x_pt = run.x * mm_per_px * PT_PER_MM;
            let y_pt = A4_HEIGHT_PT - (run.y * mm_per_px - offset_mm) * PT_PER_MM;
            let size_pt = run.size * mm_per_px * PT_PER_MM;
            let [r, g, b] = run.color.0;
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new(
                    "rg",
                    vec![
                        real(f32::from(r) / 255.0),
                        real(f32::from(g) / 255.0),
                        real(f32::from(b) / 255.0),
                    ],
                ),
                Operation::new(
                    "Tf",
                    vec![
                        Object::Name(font_resource(run.font, run.weight).as_bytes().to_vec()),
                        real(size_pt),
                    ],
                ),
                Operation::new("Td", vec![real(x_pt), real(y_pt)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        encode_win_ansi(&run.text),
                        StringFormat::Hexadecimal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ]);
        }

        let content = Content { operations }.encode().map_err(internal)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![real(0.0), real(0.0), real(A4_WIDTH_PT), real(A4_HEIGHT_PT)],
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if mode == CompressionMode::Medium {
        doc.compress();
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF serialization failed: {e}")))?;

    Ok(AssembledPdf {
        bytes,
        page_count: pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::raster::{LayoutRasterizer, Rasterizer};
    use crate::models::cv::{CvRecord, Experience, PersonalInfo};
    use crate::models::user::Locale;
    use crate::render::{render_cv, TemplateId};

    async fn capture(entries: usize, scale: f32) -> Capture {
        let mut cv = CvRecord::new_editor();
        cv.personal_info = Some(PersonalInfo {
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: "john.doe@email.com".into(),
            ..Default::default()
        });
        cv.experience = (0..entries)
            .map(|i| Experience {
                title: format!("Poste {i}"),
                company: "Digital Niger".into(),
                description: "Création de sites web responsives\nMaintenance et debugging".into(),
                ..Experience::blank()
            })
            .collect();
        let doc = render_cv(&cv, TemplateId::Moderne, Locale::Fr);
        LayoutRasterizer.capture(&doc, scale).await.unwrap()
    }

    #[test]
    fn test_page_count_uses_295mm_slices() {
        assert_eq!(page_count(0.0), 1);
        assert_eq!(page_count(297.0), 2);
        assert_eq!(page_count(295.0), 1);
        assert_eq!(page_count(295.3), 1);
        assert_eq!(page_count(600.0), 3);
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("Présent"), b"Pr\xe9sent".to_vec());
        assert_eq!(encode_win_ansi("• l’équipe"), b"\x95 l\x92\xe9quipe".to_vec());
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
    }

    #[tokio::test]
    async fn test_single_page_pdf_loads() {
        let capture = capture(1, 1.0).await;
        let pdf = assemble_pdf(&capture, 85, CompressionMode::Medium).unwrap();
        assert!(pdf.bytes.starts_with(b"%PDF-1.5"));

        let loaded = Document::load_mem(&pdf.bytes).unwrap();
        assert_eq!(loaded.get_pages().len(), 1);
        assert_eq!(pdf.page_count, 1);
    }

    #[tokio::test]
    async fn test_long_document_spans_pages() {
        let capture = capture(30, 1.0).await;
        let pdf = assemble_pdf(&capture, 70, CompressionMode::Fast).unwrap();
        let loaded = Document::load_mem(&pdf.bytes).unwrap();
        assert!(pdf.page_count > 1);
        assert_eq!(loaded.get_pages().len(), pdf.page_count);
    }

    #[tokio::test]
    async fn test_lower_quality_is_smaller() {
        let capture = capture(2, 1.5).await;
        let high = assemble_pdf(&capture, 95, CompressionMode::Medium).unwrap();
        let low = assemble_pdf(&capture, 50, CompressionMode::Medium).unwrap();
        assert!(low.bytes.len() <= high.bytes.len());
    }
}
