use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::enums::{FieldSource, TargetField};

/// Confidence reported by deterministic sources.
pub const DETERMINISTIC_CONFIDENCE: f32 = 1.0;

/// One source's proposed value for one target field. Also the shape of a
/// final, reconciled field in the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCandidate {
    pub name: TargetField,
    pub value: Option<String>,
    pub confidence: f32,
    pub source_quote: Option<String>,
    pub source: FieldSource,
}

impl FieldCandidate {
    /// Entry for a field no source could fill.
    pub fn unresolved(name: TargetField) -> Self {
        Self {
            name,
            value: None,
            confidence: 0.0,
            source_quote: None,
            source: FieldSource::Unresolved,
        }
    }

    /// Present and non-empty.
    pub fn has_value(&self) -> bool {
        self.value.as_deref().is_some_and(|v| !v.is_empty())
    }
}

/// Candidates keyed by field; iteration follows `TargetField` order.
pub type CandidateSet = BTreeMap<TargetField, FieldCandidate>;
