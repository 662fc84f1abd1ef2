//! Acquisition Gate: accepts natively decoded text or falls back to optical
//! recognition.
//!
//! Never fails. Missing capabilities, unreadable images, engine errors and
//! engine timeouts all degrade to empty optical text with no confidence.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::decode::RawDecoder;
use super::preprocess::{prepare_for_ocr, PreprocessOptions};
use super::types::{AcquiredText, DocumentKind, OcrEngine, OcrPageResult, PdfPageRenderer};
use super::ExtractionError;
use crate::config::{DEFAULT_OCR_TIMEOUT_SECS, DEFAULT_RENDER_DPI};

/// Lower-cased keywords, at least one of which marks text as lease-related.
pub const CONTRACT_KEYWORDS: [&str; 5] = ["kira", "kiracı", "kiralayan", "tl", "mahal"];

pub const DEFAULT_MIN_MEANINGFUL_CHARS: usize = 80;
pub const DEFAULT_OCR_TIMEOUT: Duration = Duration::from_secs(DEFAULT_OCR_TIMEOUT_SECS);
/// OCR workers that may still be running (including timed-out ones) before
/// new recognitions are refused.
pub const DEFAULT_MAX_OCR_WORKERS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionConfig {
    pub min_meaningful_chars: usize,
    pub render_dpi: u32,
    pub ocr_timeout: Duration,
    pub max_ocr_workers: usize,
    pub preprocess: PreprocessOptions,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            min_meaningful_chars: DEFAULT_MIN_MEANINGFUL_CHARS,
            render_dpi: DEFAULT_RENDER_DPI,
            ocr_timeout: DEFAULT_OCR_TIMEOUT,
            max_ocr_workers: DEFAULT_MAX_OCR_WORKERS,
            preprocess: PreprocessOptions::default(),
        }
    }
}

/// Trimmed, lower-cased text is long enough and mentions a contract keyword.
/// Length counts characters, not bytes.
pub fn is_meaningful_text(text: &str, min_chars: usize) -> bool {
    let content = text.trim().to_lowercase();
    if content.chars().count() < min_chars {
        return false;
    }
    CONTRACT_KEYWORDS.iter().any(|kw| content.contains(kw))
}

pub struct AcquisitionGate {
    decoder: RawDecoder,
    ocr_engine: Option<Arc<dyn OcrEngine + Send + Sync>>,
    pdf_renderer: Option<Box<dyn PdfPageRenderer + Send + Sync>>,
    config: AcquisitionConfig,
    live_ocr_workers: Arc<AtomicUsize>,
}

impl AcquisitionGate {
    /// Gate without optical capabilities; PDFs without a text layer and all
    /// image inputs come back as empty optical text.
    pub fn new(decoder: RawDecoder, config: AcquisitionConfig) -> Self {
        Self {
            decoder,
            ocr_engine: None,
            pdf_renderer: None,
            config,
            live_ocr_workers: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_ocr_engine(mut self, engine: Arc<dyn OcrEngine + Send + Sync>) -> Self {
        self.ocr_engine = Some(engine);
        self
    }

    pub fn with_pdf_renderer(mut self, renderer: Box<dyn PdfPageRenderer + Send + Sync>) -> Self {
        self.pdf_renderer = Some(renderer);
        self
    }

    pub fn has_ocr_engine(&self) -> bool {
        self.ocr_engine.is_some()
    }

    /// OCR worker threads not yet finished, timed-out ones included.
    pub fn live_ocr_workers(&self) -> usize {
        self.live_ocr_workers.load(Ordering::SeqCst)
    }

    pub fn is_meaningful(&self, text: &str) -> bool {
        is_meaningful_text(text, self.config.min_meaningful_chars)
    }

    /// Produce raw text for a document, choosing native or optical.
    pub fn acquire(&self, bytes: &[u8], document_type: &str) -> AcquiredText {
        let kind = DocumentKind::from_hint(document_type);

        // Plain text is trusted as-is, even when empty
        if kind == DocumentKind::PlainText {
            return AcquiredText::native(self.decoder.decode(bytes, kind));
        }

        if bytes.is_empty() {
            debug!(document_type, "Empty input, optical path without an image");
            return self.recognize(None);
        }

        match kind {
            DocumentKind::Pdf => {
                let text = self.decoder.decode(bytes, kind);
                if self.is_meaningful(&text) {
                    debug!(text_length = text.len(), "Accepted native PDF text layer");
                    return AcquiredText::native(text);
                }
                info!(
                    text_length = text.len(),
                    "PDF text layer missing or not meaningful, falling back to OCR"
                );
                let page = self.rasterize_first_page(bytes);
                self.recognize(page.as_deref())
            }
            _ => self.recognize(Some(bytes)),
        }
    }

    fn rasterize_first_page(&self, bytes: &[u8]) -> Option<Vec<u8>> {
        let Some(renderer) = &self.pdf_renderer else {
            warn!("No PDF renderer configured, cannot rasterize for OCR");
            return None;
        };
        match renderer.render_first_page(bytes, self.config.render_dpi) {
            Ok(png) => Some(png),
            Err(e) => {
                warn!(error = %e, "Failed to rasterize first PDF page");
                None
            }
        }
    }

    /// Optical path. Every failure becomes empty text with no confidence.
    fn recognize(&self, image: Option<&[u8]>) -> AcquiredText {
        let Some(engine) = &self.ocr_engine else {
            warn!("OCR engine is not configured, returning empty optical text");
            return AcquiredText::optical_empty();
        };
        let Some(image) = image else {
            warn!("No image available for OCR");
            return AcquiredText::optical_empty();
        };

        let prepared = match prepare_for_ocr(image, &self.config.preprocess) {
            Ok(png) => png,
            Err(e) => {
                warn!(error = %e, "Image could not be prepared for OCR");
                return AcquiredText::optical_empty();
            }
        };

        let live = self.live_ocr_workers();
        if live >= self.config.max_ocr_workers {
            warn!(
                live_workers = live,
                limit = self.config.max_ocr_workers,
                "Too many OCR workers still running, skipping recognition"
            );
            return AcquiredText::optical_empty();
        }

        match run_with_timeout(
            Arc::clone(engine),
            prepared,
            self.config.ocr_timeout,
            Arc::clone(&self.live_ocr_workers),
        ) {
            Ok(result) => {
                info!(
                    engine = engine.name(),
                    text_length = result.text.len(),
                    confidence = ?result.confidence,
                    "OCR complete"
                );
                AcquiredText::optical(result.text, result.confidence)
            }
            Err(e) => {
                warn!(
                    engine = engine.name(),
                    error = %e,
                    live_workers = self.live_ocr_workers(),
                    "OCR failed"
                );
                AcquiredText::optical_empty()
            }
        }
    }
}

/// Decrements the live-worker count when the worker thread ends.
struct WorkerSlot(Arc<AtomicUsize>);

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Run the engine on a worker thread, giving up after `timeout`.
/// A timed-out worker is left to finish on its own; its result is dropped.
/// `live` counts the worker until its thread ends.
fn run_with_timeout(
    engine: Arc<dyn OcrEngine + Send + Sync>,
    image: Vec<u8>,
    timeout: Duration,
    live: Arc<AtomicUsize>,
) -> Result<OcrPageResult, ExtractionError> {
    let (tx, rx) = mpsc::channel();
    live.fetch_add(1, Ordering::SeqCst);
    let slot = WorkerSlot(live);
    std::thread::Builder::new()
        .name("ocr-worker".into())
        .spawn(move || {
            let _slot = slot;
            let _ = tx.send(engine.ocr_image(&image));
        })
        .map_err(|e| ExtractionError::OcrProcessing(format!("Failed to spawn OCR worker: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(ExtractionError::OcrTimeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => Err(ExtractionError::OcrProcessing(
            "OCR worker exited without a result".into(),
        )),
    }
}
