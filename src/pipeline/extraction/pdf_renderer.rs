//! First-page rasterization via Google PDFium, feeding the OCR fallback for
//! PDFs without a usable text layer.
//!
//! `PdfiumRenderer` holds no library handle: the upstream `Pdfium` type is
//! `!Send`, so each render binds the library again. The OS caches the
//! `dlopen`, so repeat loads are near-free.

use std::io::Cursor;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use image::ImageOutputFormat;
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use super::types::PdfPageRenderer;
use super::ExtractionError;

/// Maximum dimension (width or height) for rendered page images.
/// Prevents OOM on extremely large pages or absurd DPI settings.
const MAX_DIMENSION_PX: u32 = 4096;

/// PDF points per inch (standard PDF unit).
const POINTS_PER_INCH: f32 = 72.0;

pub struct PdfiumRenderer {
    library_path: Option<PathBuf>,
}

impl PdfiumRenderer {
    /// Create a renderer, verifying the PDFium library is loadable.
    ///
    /// Discovery order:
    /// 1. `library_path` (from `PDFIUM_DYNAMIC_LIB_PATH`)
    /// 2. Alongside the running executable
    /// 3. System library search paths
    pub fn new(library_path: Option<PathBuf>) -> Result<Self, ExtractionError> {
        let _ = load_pdfium(library_path.as_deref())?;
        Ok(Self { library_path })
    }
}

fn load_pdfium(library_path: Option<&Path>) -> Result<Pdfium, ExtractionError> {
    if let Some(path) = library_path {
        debug!(path = %path.display(), "Loading PDFium from configured path");
        let bindings = Pdfium::bind_to_library(path).map_err(|e| ExtractionError::PdfRendering {
            page: 0,
            reason: format!("Failed to load PDFium from {}: {e}", path.display()),
        })?;
        return Ok(Pdfium::new(bindings));
    }

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        for dir in [exe_dir.clone(), exe_dir.join("pdfium").join("lib")] {
            let lib_path =
                Pdfium::pdfium_platform_library_name_at_path(dir.to_string_lossy().as_ref());
            if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
                debug!(dir = %dir.display(), "Loaded PDFium next to executable");
                return Ok(Pdfium::new(bindings));
            }
        }
    }

    let bindings =
        Pdfium::bind_to_system_library().map_err(|e| ExtractionError::PdfRendering {
            page: 0,
            reason: format!(
                "PDFium library not found. Set PDFIUM_DYNAMIC_LIB_PATH or install PDFium: {e}"
            ),
        })?;
    Ok(Pdfium::new(bindings))
}

/// Encrypted PDFs get their own error so the gate can log them distinctly.
fn map_load_error(e: PdfiumError) -> ExtractionError {
    let msg = e.to_string().to_lowercase();
    if msg.contains("password") || msg.contains("encrypt") {
        ExtractionError::PdfEncrypted
    } else {
        ExtractionError::PdfRendering {
            page: 0,
            reason: format!("Failed to load PDF: {e}"),
        }
    }
}

/// Pixel dimensions for rendering at `dpi`, both clamped to
/// [1, MAX_DIMENSION_PX] with aspect ratio preserved when capping.
fn compute_render_dimensions(width_points: f32, height_points: f32, dpi: u32) -> (u32, u32) {
    let scale = dpi as f32 / POINTS_PER_INCH;
    let raw_w = (width_points * scale).max(1.0);
    let raw_h = (height_points * scale).max(1.0);

    let max_dim = raw_w.max(raw_h);
    if max_dim > MAX_DIMENSION_PX as f32 {
        let ratio = MAX_DIMENSION_PX as f32 / max_dim;
        let w = ((raw_w * ratio) as u32).clamp(1, MAX_DIMENSION_PX);
        let h = ((raw_h * ratio) as u32).clamp(1, MAX_DIMENSION_PX);
        (w, h)
    } else {
        (raw_w as u32, raw_h as u32)
    }
}

impl PdfPageRenderer for PdfiumRenderer {
    fn render_first_page(&self, pdf_bytes: &[u8], dpi: u32) -> Result<Vec<u8>, ExtractionError> {
        let pdfium = load_pdfium(self.library_path.as_deref())?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf_bytes, None)
            .map_err(map_load_error)?;

        let pages = document.pages();
        let page = pages.get(0).map_err(|_| ExtractionError::PdfRendering {
            page: 0,
            reason: "Document has no pages".into(),
        })?;

        let (width_points, height_points) = (page.width().value, page.height().value);
        let (target_w, target_h) = compute_render_dimensions(width_points, height_points, dpi);
        let scale = dpi as f32 / POINTS_PER_INCH;
        if width_points * scale > MAX_DIMENSION_PX as f32
            || height_points * scale > MAX_DIMENSION_PX as f32
        {
            warn!(
                dpi,
                width = target_w,
                height = target_h,
                "Page dimensions capped to {MAX_DIMENSION_PX}px"
            );
        }

        let config = PdfRenderConfig::new()
            .set_target_width(target_w as i32)
            .set_maximum_height(target_h as i32);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| ExtractionError::PdfRendering {
                page: 0,
                reason: format!("Rendering failed: {e}"),
            })?;

        let mut cursor = Cursor::new(Vec::new());
        bitmap
            .as_image()
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .map_err(|e| ExtractionError::ImageProcessing(format!("PNG encoding failed: {e}")))?;
        let png_bytes = cursor.into_inner();

        debug!(
            dpi,
            width = target_w,
            height = target_h,
            png_size = png_bytes.len(),
            "Rendered first PDF page to PNG"
        );

        Ok(png_bytes)
    }
}

// ── Mock for testing ──────────────────────────────────────

/// Mock renderer returning a small generated PNG, or failing on demand.
#[cfg(test)]
pub struct MockPdfPageRenderer {
    failing: bool,
    calls: AtomicUsize,
}

#[cfg(test)]
impl MockPdfPageRenderer {
    pub fn new() -> Self {
        Self {
            failing: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
impl PdfPageRenderer for MockPdfPageRenderer {
    fn render_first_page(&self, _pdf_bytes: &[u8], _dpi: u32) -> Result<Vec<u8>, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(ExtractionError::PdfRendering {
                page: 0,
                reason: "mock renderer failure".into(),
            });
        }
        Ok(test_png(64, 64))
    }
}

/// White grayscale PNG of the given size.
#[cfg(test)]
pub(crate) fn test_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::GrayImage::from_pixel(width, height, image::Luma([255u8]));
    let mut cursor = Cursor::new(Vec::new());
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .unwrap();
    cursor.into_inner()
}
