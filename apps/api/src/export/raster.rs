//! Capture of a rendered document into a raster image.

use async_trait::async_trait;
use image::RgbImage;

use crate::errors::AppError;
use crate::layout::{layout_document, Scene, Shape};
use crate::render::{RenderedDocument, Rgb};

/// Taller canvases than this are refused rather than allocated.
const MAX_CANVAS_HEIGHT_PX: u32 = 60_000;

/// A captured document: the painted canvas plus the scene it came from, so
/// the assembler can lay real text over the image.
#[derive(Debug, Clone)]
pub struct Capture {
    pub image: RgbImage,
    pub scene: Scene,
}

/// Turns a document into pixels. Other capture backends plug in here.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn capture(&self, doc: &RenderedDocument, scale: f32) -> Result<Capture, AppError>;
}

/// Paints the layout's shapes with the `image` crate.
#[derive(Debug, Clone, Default)]
pub struct LayoutRasterizer;

#[async_trait]
impl Rasterizer for LayoutRasterizer {
    async fn capture(&self, doc: &RenderedDocument, scale: f32) -> Result<Capture, AppError> {
        if doc.is_blank() {
            return Err(AppError::RenderCapture(
                "document has nothing to capture".to_string(),
            ));
        }
        let doc = doc.clone();
        tokio::task::spawn_blocking(move || {
            let scene = layout_document(&doc);
            let image = paint(&scene, scale)?;
            Ok(Capture { image, scene })
        })
        .await
        .map_err(|e| AppError::RenderCapture(format!("capture task failed: {e}")))?
    }
}

fn pixel(color: Rgb) -> image::Rgb<u8> {
    image::Rgb(color.0)
}

/// Paints `scene` at `scale` device pixels per CSS pixel.
pub fn paint(scene: &Scene, scale: f32) -> Result<RgbImage, AppError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(AppError::RenderCapture(format!("invalid scale {scale}")));
    }
    let width = (scene.width * scale).round() as u32;
    let height = (scene.height * scale).round() as u32;
    if width == 0 || height == 0 {
        return Err(AppError::RenderCapture("empty capture region".to_string()));
    }
    if height > MAX_CANVAS_HEIGHT_PX {
        return Err(AppError::CanvasTooTall {
            height,
            limit: MAX_CANVAS_HEIGHT_PX,
        });
    }

    let mut img = RgbImage::from_pixel(width, height, pixel(scene.background));
    for shape in &scene.shapes {
        match *shape {
            Shape::Rect { x, y, w, h, color } => {
                fill_rect(&mut img, x * scale, y * scale, w * scale, h * scale, pixel(color))
            }
            Shape::Disc { cx, cy, r, color } => {
                fill_disc(&mut img, cx * scale, cy * scale, r * scale, pixel(color))
            }
        }
    }
    Ok(img)
}

fn fill_rect(img: &mut RgbImage, x: f32, y: f32, w: f32, h: f32, color: image::Rgb<u8>) {
    let x0 = x.max(0.0).round() as u32;
    let y0 = y.max(0.0).round() as u32;
    // hairlines still cover one pixel
    let x1 = ((x + w).round() as u32).max(x0 + 1).min(img.width());
    let y1 = ((y + h).round() as u32).max(y0 + 1).min(img.height());
    for py in y0..y1 {
        for px in x0..x1 {
            img.put_pixel(px, py, color);
        }
    }
}

fn fill_disc(img: &mut RgbImage, cx: f32, cy: f32, r: f32, color: image::Rgb<u8>) {
    let x0 = (cx - r).floor().max(0.0) as u32;
    let y0 = (cy - r).floor().max(0.0) as u32;
    let x1 = ((cx + r).ceil() as u32).min(img.width());
    let y1 = ((cy + r).ceil() as u32).min(img.height());
    let r2 = r * r;
    for py in y0..y1 {
        for px in x0..x1 {
            let dx = px as f32 + 0.5 - cx;
            let dy = py as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= r2 {
                img.put_pixel(px, py, color);
            }
        }
    }
}
