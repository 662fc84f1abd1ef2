use crate::models::TextSource;

use super::ExtractionError;

/// How the Raw Decoder and the Acquisition Gate treat a document, decided
/// from the caller's document-type hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
    /// Anything else is assumed to be an image.
    Other,
}

impl DocumentKind {
    /// Case-insensitive suffix match on the hint (`.txt`/`.md`, `.pdf`).
    pub fn from_hint(document_type: &str) -> Self {
        let hint = document_type.trim().to_lowercase();
        if hint.ends_with(".txt") || hint.ends_with(".md") {
            Self::PlainText
        } else if hint.ends_with(".pdf") {
            Self::Pdf
        } else {
            Self::Other
        }
    }
}

/// Text produced by the Acquisition Gate.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquiredText {
    pub text: String,
    pub source: TextSource,
    /// Recognition confidence; always `None` on the native path.
    pub confidence: Option<f32>,
}

impl AcquiredText {
    pub fn native(text: String) -> Self {
        Self {
            text,
            source: TextSource::Native,
            confidence: None,
        }
    }

    pub fn optical(text: String, confidence: Option<f32>) -> Self {
        Self {
            text,
            source: TextSource::Optical,
            confidence,
        }
    }

    /// Degraded optical outcome: recognition unavailable or failed.
    pub fn optical_empty() -> Self {
        Self::optical(String::new(), None)
    }
}

/// Raw OCR result from the engine
#[derive(Debug, Clone, PartialEq)]
pub struct OcrPageResult {
    pub text: String,
    /// 0.0–1.0 when the engine reports one.
    pub confidence: Option<f32>,
}

/// OCR engine abstraction (allows mocking for tests)
pub trait OcrEngine {
    fn name(&self) -> &str;

    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError>;
}

/// One PDF text-layer reader. Returns one string per page.
pub trait PdfTextReader {
    fn name(&self) -> &str;

    fn read_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError>;
}

/// Rasterizes PDF pages for the OCR fallback.
pub trait PdfPageRenderer {
    /// Render the first page at `dpi`, PNG-encoded.
    fn render_first_page(&self, pdf_bytes: &[u8], dpi: u32) -> Result<Vec<u8>, ExtractionError>;
}

/// Lets callers keep a handle on a reader or engine after handing it over.
impl<T: PdfTextReader + ?Sized> PdfTextReader for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        (**self).read_pages(pdf_bytes)
    }
}

impl<T: PdfPageRenderer + ?Sized> PdfPageRenderer for std::sync::Arc<T> {
    fn render_first_page(&self, pdf_bytes: &[u8], dpi: u32) -> Result<Vec<u8>, ExtractionError> {
        (**self).render_first_page(pdf_bytes, dpi)
    }
}

impl<T: OcrEngine + ?Sized> OcrEngine for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        (**self).ocr_image(image_bytes)
    }
}
