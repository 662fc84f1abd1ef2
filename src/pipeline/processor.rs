//! Extraction pipeline orchestrator.
//!
//! Single entry point that drives one document through
//! acquire → (empty short-circuit) → pattern + model extraction → reconcile.
//!
//! Every capability sits behind a trait (PdfTextReader, PdfPageRenderer,
//! OcrEngine, LlmClient) so the pipeline is fully testable with mocks.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::Settings;
use crate::models::{ExtractionResult, FieldCandidate};
use crate::pipeline::extraction::decode::RawDecoder;
use crate::pipeline::extraction::gate::AcquisitionGate;
use crate::pipeline::extraction::pdf_renderer::PdfiumRenderer;
use crate::pipeline::patterns::PatternExtractor;
use crate::pipeline::reconcile::Reconciler;
use crate::pipeline::structuring::ollama::OllamaClient;
use crate::pipeline::structuring::orchestrator::ModelExtractor;
use crate::pipeline::structuring::StructuringError;

// ---------------------------------------------------------------------------
// Run states
// ---------------------------------------------------------------------------

/// Lifecycle of one run. `Empty` and `Done` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Acquiring,
    Empty,
    Extracting,
    Reconciling,
    Done,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Holds no per-run state; share it behind `Arc` and call `run` concurrently.
pub struct ExtractionPipeline {
    gate: AcquisitionGate,
    patterns: PatternExtractor,
    model: ModelExtractor,
    reconciler: Reconciler,
}

impl ExtractionPipeline {
    pub fn new(
        gate: AcquisitionGate,
        patterns: PatternExtractor,
        model: ModelExtractor,
        reconciler: Reconciler,
    ) -> Self {
        Self {
            gate,
            patterns,
            model,
            reconciler,
        }
    }

    /// Wire the production capabilities from settings.
    ///
    /// PDFium and Tesseract are optional: when unavailable the gate degrades
    /// to empty optical text for documents that need OCR.
    pub fn production(settings: &Settings) -> Result<Self, StructuringError> {
        let mut gate = AcquisitionGate::new(
            RawDecoder::with_default_readers(),
            settings.acquisition_config(),
        );

        match PdfiumRenderer::new(settings.pdfium_library_path.clone()) {
            Ok(renderer) => gate = gate.with_pdf_renderer(Box::new(renderer)),
            Err(e) => tracing::warn!(error = %e, "PDFium unavailable, scanned PDFs will not be OCR'd"),
        }

        if let Some(engine) = production_ocr_engine(settings) {
            gate = gate.with_ocr_engine(engine);
        }

        let llm = OllamaClient::new(&settings.ollama_base_url, settings.ollama_timeout())?;
        tracing::info!(
            ollama = %settings.ollama_base_url,
            model = %settings.ollama_model,
            ocr = gate.has_ocr_engine(),
            "Extraction pipeline ready"
        );

        Ok(Self::new(
            gate,
            PatternExtractor::new(),
            ModelExtractor::new(Arc::new(llm), &settings.ollama_model),
            Reconciler::default(),
        ))
    }

    /// Process one document. Never fails: degraded inputs yield unresolved
    /// fields.
    pub fn run(&self, bytes: &[u8], document_type: &str) -> ExtractionResult {
        self.run_with_outcome(bytes, document_type).0
    }

    /// Like `run`, also reporting the terminal state.
    pub fn run_with_outcome(&self, bytes: &[u8], document_type: &str) -> (ExtractionResult, PipelineState) {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("extraction_run", %run_id, document_type);
        let _guard = span.enter();

        tracing::debug!(state = ?PipelineState::Acquiring, input_bytes = bytes.len(), "Run started");
        let acquired = self.gate.acquire(bytes, document_type);

        let (fields, state) = if self.gate.is_meaningful(&acquired.text) {
            (self.extract_fields(&acquired.text, document_type), PipelineState::Done)
        } else {
            (Reconciler::unresolved_fields(), PipelineState::Empty)
        };

        let result = ExtractionResult {
            document_type: document_type.to_string(),
            text_source_used: acquired.source,
            optical_confidence: acquired.confidence,
            fields,
            raw_text: acquired.text,
        };

        tracing::info!(
            state = ?state,
            text_source = %result.text_source_used,
            confidence = ?result.optical_confidence,
            text_length = result.raw_text.len(),
            resolved = result.resolved_count(),
            "Run finished"
        );

        (result, state)
    }

    /// Extracting → Reconciling on already-acquired text. Always returns one
    /// entry per target field.
    pub fn extract_fields(&self, raw_text: &str, document_type: &str) -> Vec<FieldCandidate> {
        tracing::debug!(state = ?PipelineState::Extracting, "Extracting candidates");
        let pattern = self.patterns.extract(raw_text);
        let model = self.model.extract(raw_text, document_type);

        tracing::debug!(
            state = ?PipelineState::Reconciling,
            pattern_hits = pattern.values().filter(|c| c.has_value()).count(),
            model_hits = model.len(),
            "Reconciling candidates"
        );
        self.reconciler.reconcile(&pattern, &model)
    }
}

#[cfg(feature = "ocr")]
fn production_ocr_engine(
    settings: &Settings,
) -> Option<Arc<dyn crate::pipeline::extraction::types::OcrEngine + Send + Sync>> {
    use crate::pipeline::extraction::ocr::BundledTesseract;

    let Some(dir) = &settings.tessdata_dir else {
        tracing::warn!("TESSDATA_DIR not set, OCR disabled");
        return None;
    };
    match BundledTesseract::new(dir, &settings.tesseract_lang) {
        Ok(engine) => Some(Arc::new(engine)),
        Err(e) => {
            tracing::warn!(error = %e, "Tesseract unavailable, OCR disabled");
            None
        }
    }
}

#[cfg(not(feature = "ocr"))]
fn production_ocr_engine(
    _settings: &Settings,
) -> Option<Arc<dyn crate::pipeline::extraction::types::OcrEngine + Send + Sync>> {
    tracing::warn!("Built without the `ocr` feature, OCR disabled");
    None
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::test_support::{lease_text, mock_pipeline};
    use super::*;
    use crate::models::{FieldSource, TargetField, TextSource};
    use crate::pipeline::extraction::ocr::MockOcrEngine;
    use crate::pipeline::extraction::pdf::test_support::make_test_pdf;
    use crate::pipeline::extraction::pdf_renderer::test_png;
    use crate::pipeline::structuring::ollama::MockLlmClient;

    const MODEL_REPLY: &str = r#"{"M2": {"value": "120", "confidence": 0.7}}"#;

    fn assert_scenario_fields(fields: &[FieldCandidate]) {
        assert_eq!(fields.len(), TargetField::COUNT);
        let names: Vec<_> = fields.iter().map(|f| f.name).collect();
        assert_eq!(names, TargetField::ALL.to_vec());

        let location = &fields[0];
        assert_eq!(location.value.as_deref(), Some("OCR123"));
        assert_eq!(location.confidence, 1.0);
        assert_eq!(location.source, FieldSource::Pattern);

        let area = &fields[1];
        assert_eq!(area.value.as_deref(), Some("120"));
        assert_eq!(area.confidence, 0.7);
        assert_eq!(area.source, FieldSource::Model);

        let rent = &fields[2];
        assert_eq!(rent.value.as_deref(), Some("5000"));
        assert_eq!(rent.confidence, 1.0);
        assert_eq!(rent.source, FieldSource::Pattern);

        for field in &fields[3..] {
            assert!(field.value.is_none(), "{} should be unresolved", field.name);
            assert_eq!(field.confidence, 0.0);
            assert_eq!(field.source, FieldSource::Unresolved);
        }
    }

    #[test]
    fn reconciles_pattern_and_model_on_acquired_text() {
        let llm = Arc::new(MockLlmClient::new(MODEL_REPLY));
        let pipeline = mock_pipeline(llm.clone(), None);

        let fields = pipeline.extract_fields("Mahal Kodu: OCR123\nAsgari Kira: 5000", "scan.png");
        assert_scenario_fields(&fields);
        assert_eq!(llm.calls(), 1);
    }

    #[test]
    fn optical_document_runs_end_to_end() {
        let text = lease_text("Mahal Kodu: OCR123\nAsgari Kira: 5000");
        let llm = Arc::new(MockLlmClient::new(MODEL_REPLY));
        let ocr = Arc::new(MockOcrEngine::new(&text, Some(0.83)));
        let pipeline = mock_pipeline(llm.clone(), Some(ocr.clone()));

        let (result, state) = pipeline.run_with_outcome(&test_png(64, 64), "scan.png");

        assert_eq!(state, PipelineState::Done);
        assert_eq!(result.document_type, "scan.png");
        assert_eq!(result.text_source_used, TextSource::Optical);
        assert_eq!(result.optical_confidence, Some(0.83));
        assert_eq!(result.raw_text, text);
        assert_scenario_fields(&result.fields);
        assert_eq!(ocr.calls(), 1);
        assert_eq!(llm.calls(), 1);
    }

    #[test]
    fn plain_text_never_uses_ocr() {
        let text = lease_text("Asgari Kira: 5000");
        let llm = Arc::new(MockLlmClient::new("{}"));
        let ocr = Arc::new(MockOcrEngine::new("unused", Some(0.9)));
        let pipeline = mock_pipeline(llm, Some(ocr.clone()));

        let result = pipeline.run(text.as_bytes(), "contract.txt");
        assert_eq!(result.text_source_used, TextSource::Native);
        assert!(result.optical_confidence.is_none());
        assert_eq!(result.value_of(TargetField::MinimumRent), Some("5000"));
        assert_eq!(ocr.calls(), 0);
    }

    #[test]
    fn empty_pdf_without_engine_is_empty_state() {
        let llm = Arc::new(MockLlmClient::new(MODEL_REPLY));
        let pipeline = mock_pipeline(llm.clone(), None);

        let (result, state) = pipeline.run_with_outcome(b"", "contract.pdf");
        assert_eq!(state, PipelineState::Empty);
        assert_eq!(result.raw_text, "");
        assert_eq!(result.text_source_used, TextSource::Optical);
        assert!(result.optical_confidence.is_none());
        assert_eq!(result.fields, Reconciler::unresolved_fields());
        assert_eq!(llm.calls(), 0);
    }

    #[test]
    fn short_keywordless_text_short_circuits() {
        let llm = Arc::new(MockLlmClient::new(MODEL_REPLY));
        let pipeline = mock_pipeline(llm.clone(), None);

        let (result, state) = pipeline.run_with_outcome(b"lorem ipsum 42", "notes.txt");
        assert_eq!(state, PipelineState::Empty);
        assert_eq!(result.raw_text, "lorem ipsum 42");
        assert_eq!(result.text_source_used, TextSource::Native);
        assert_eq!(result.resolved_count(), 0);
        assert_eq!(llm.calls(), 0);
    }

    #[test]
    fn model_failure_leaves_pattern_results() {
        let llm = Arc::new(MockLlmClient::failing());
        let pipeline = mock_pipeline(llm.clone(), None);

        let result = pipeline.run(lease_text("Asgari Kira: 5000").as_bytes(), "contract.md");
        assert_eq!(result.value_of(TargetField::MinimumRent), Some("5000"));
        assert_eq!(result.resolved_count(), 1);
        assert_eq!(llm.calls(), 1);
    }

    #[test]
    fn pattern_beats_model_end_to_end() {
        let llm = Arc::new(MockLlmClient::new(
            r#"{"Asgari_Kira": {"value": "9999", "confidence": 0.99}}"#,
        ));
        let pipeline = mock_pipeline(llm, None);

        let result = pipeline.run(lease_text("Asgari Kira: 5000").as_bytes(), "contract.txt");
        let rent = result.field(TargetField::MinimumRent).unwrap();
        assert_eq!(rent.value.as_deref(), Some("5000"));
        assert_eq!(rent.source, FieldSource::Pattern);
    }

    #[test]
    fn every_run_has_one_entry_per_field() {
        let llm = Arc::new(MockLlmClient::new("not json"));
        let pipeline = mock_pipeline(llm, None);
        for (bytes, hint) in [
            (&b""[..], "a.txt"),
            (&b"\xff\xfe garbage"[..], "b.pdf"),
            (&b"random"[..], "c.jpg"),
        ] {
            let result = pipeline.run(bytes, hint);
            assert_eq!(result.fields.len(), TargetField::COUNT);
        }
    }

    #[test]
    fn generated_pdf_runs_through_native_path() {
        let llm = Arc::new(MockLlmClient::new("{}"));
        let ocr = Arc::new(MockOcrEngine::new("unused", Some(0.9)));
        let pipeline = mock_pipeline(llm.clone(), Some(ocr.clone()));

        let pdf = make_test_pdf(&[
            "Bu kira sozlesmesi kiralayan ile kiraci arasinda imzalanmistir.",
            "Magaza alani ve kullanim sartlari asagidaki gibidir.",
            "Mahal Kodu: B7",
            "Asgari Kira: 5000",
        ]);
        let (result, state) = pipeline.run_with_outcome(&pdf, "x.PDF");

        assert_eq!(state, PipelineState::Done);
        assert_eq!(result.text_source_used, TextSource::Native);
        assert!(result.optical_confidence.is_none());
        assert_eq!(result.value_of(TargetField::LocationCode), Some("B7"));
        assert_eq!(result.value_of(TargetField::MinimumRent), Some("5000"));
        assert_eq!(llm.calls(), 1);
        assert_eq!(ocr.calls(), 0);
    }

    #[test]
    fn production_pipeline_builds_without_optional_capabilities() {
        let settings = Settings {
            pdfium_library_path: Some("/nonexistent/libpdfium.so".into()),
            ..Settings::default()
        };
        assert!(ExtractionPipeline::production(&settings).is_ok());
    }

    #[test]
    fn pipeline_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ExtractionPipeline>();
    }
}
