use serde::{Deserialize, Serialize};

use super::enums::{TargetField, TextSource};
use super::field::FieldCandidate;

/// Outcome of one pipeline run.
///
/// `fields` always holds exactly one entry per `TargetField`, in
/// `TargetField::ALL` order. `raw_text` is the text the extractors saw,
/// byte for byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub document_type: String,
    pub text_source_used: TextSource,
    pub optical_confidence: Option<f32>,
    pub fields: Vec<FieldCandidate>,
    pub raw_text: String,
}

impl ExtractionResult {
    pub fn field(&self, name: TargetField) -> Option<&FieldCandidate> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Value of a field, if resolved.
    pub fn value_of(&self, name: TargetField) -> Option<&str> {
        self.field(name).and_then(|f| f.value.as_deref())
    }

    pub fn resolved_count(&self) -> usize {
        self.fields.iter().filter(|f| f.has_value()).count()
    }
}
