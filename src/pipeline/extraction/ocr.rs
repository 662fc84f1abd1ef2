#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
#[cfg(test)]
use std::sync::Mutex;
#[cfg(test)]
use std::time::Duration;

#[cfg(any(feature = "ocr", test))]
use super::types::{OcrEngine, OcrPageResult};
#[cfg(any(feature = "ocr", test))]
use super::ExtractionError;

/// Bundled Tesseract OCR engine.
/// Only available when compiled with the `ocr` feature flag.
#[cfg(feature = "ocr")]
pub struct BundledTesseract {
    tessdata_dir: std::path::PathBuf,
    languages: String,
}

#[cfg(feature = "ocr")]
impl BundledTesseract {
    /// `languages` uses Tesseract's `+` syntax (e.g. "tur+eng"); every listed
    /// language needs its traineddata under `tessdata_dir`.
    pub fn new(tessdata_dir: &std::path::Path, languages: &str) -> Result<Self, ExtractionError> {
        if !tessdata_dir.is_dir() {
            return Err(ExtractionError::TessdataNotFound(tessdata_dir.to_path_buf()));
        }
        for lang in languages.split('+').filter(|l| !l.is_empty()) {
            let data = tessdata_dir.join(format!("{lang}.traineddata"));
            if !data.exists() {
                return Err(ExtractionError::TessdataNotFound(data));
            }
        }

        tracing::info!(
            tessdata = %tessdata_dir.display(),
            languages,
            "Tesseract OCR engine ready"
        );
        Ok(Self {
            tessdata_dir: tessdata_dir.to_path_buf(),
            languages: languages.to_string(),
        })
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for BundledTesseract {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        let tessdata_str = self
            .tessdata_dir
            .to_str()
            .ok_or_else(|| ExtractionError::OcrInit("Invalid tessdata path".into()))?;

        let mut tess = tesseract::Tesseract::new(Some(tessdata_str), Some(self.languages.as_str()))
            .map_err(|e| ExtractionError::OcrInit(format!("{e:?}")))?
            .set_image_from_mem(image_bytes)
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;

        let text = tess
            .get_text()
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;

        // Negative means the engine produced no confidence
        let mean = tess.mean_text_conf();
        let confidence = (mean >= 0).then(|| mean as f32 / 100.0);

        Ok(OcrPageResult { text, confidence })
    }
}

/// Mock OCR engine for unit testing without Tesseract.
#[cfg(test)]
pub struct MockOcrEngine {
    text: String,
    confidence: Option<f32>,
    failing: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_image: Mutex<Option<Vec<u8>>>,
}

#[cfg(test)]
impl MockOcrEngine {
    pub fn new(text: &str, confidence: Option<f32>) -> Self {
        Self {
            text: text.to_string(),
            confidence,
            failing: false,
            delay: None,
            calls: AtomicUsize::new(0),
            last_image: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new("", None)
        }
    }

    /// Sleep before answering, to exercise the recognition timeout.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_image(&self) -> Option<Vec<u8>> {
        self.last_image.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl OcrEngine for MockOcrEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_image.lock().unwrap() = Some(image_bytes.to_vec());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.failing {
            return Err(ExtractionError::OcrProcessing("mock engine failure".into()));
        }
        Ok(OcrPageResult {
            text: self.text.clone(),
            confidence: self.confidence,
        })
    }
}
