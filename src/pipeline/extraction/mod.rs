pub mod types;
pub mod decode;
pub mod pdf;
pub mod pdf_renderer;
pub mod preprocess;
pub mod ocr;
pub mod gate;

pub use types::*;
pub use decode::*;
pub use pdf::*;
pub use pdf_renderer::*;
pub use preprocess::*;
pub use ocr::*;
pub use gate::*;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Tesseract OCR initialization failed: {0}")]
    OcrInit(String),

    #[error("Tessdata not found at: {0}")]
    TessdataNotFound(PathBuf),

    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("OCR did not finish within {0:?}")]
    OcrTimeout(Duration),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("PDF rendering failed for page {page}: {reason}")]
    PdfRendering { page: usize, reason: String },

    #[error("PDF is password-protected")]
    PdfEncrypted,

    #[error("Image processing error: {0}")]
    ImageProcessing(String),
}
