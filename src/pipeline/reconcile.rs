//! Per-field precedence between pattern and model candidates.

use crate::models::{CandidateSet, FieldCandidate, FieldSource, TargetField};

/// Pattern candidates at or above this confidence beat the model.
pub const DEFAULT_PATTERN_THRESHOLD: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcilerConfig {
    pub pattern_threshold: f32,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            pattern_threshold: DEFAULT_PATTERN_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(config: ReconcilerConfig) -> Self {
        Self { config }
    }

    /// One final entry per target field, in canonical order.
    ///
    /// A confident pattern value wins; otherwise any model value; otherwise
    /// the field is unresolved.
    pub fn reconcile(&self, pattern: &CandidateSet, model: &CandidateSet) -> Vec<FieldCandidate> {
        TargetField::ALL
            .iter()
            .map(|&field| {
                if let Some(p) = pattern
                    .get(&field)
                    .filter(|p| p.has_value() && p.confidence >= self.config.pattern_threshold)
                {
                    return FieldCandidate {
                        name: field,
                        source: FieldSource::Pattern,
                        ..p.clone()
                    };
                }
                if let Some(m) = model.get(&field).filter(|m| m.has_value()) {
                    return FieldCandidate {
                        name: field,
                        source: FieldSource::Model,
                        ..m.clone()
                    };
                }
                FieldCandidate::unresolved(field)
            })
            .collect()
    }

    /// Every field unresolved, for runs that never reach extraction.
    pub fn unresolved_fields() -> Vec<FieldCandidate> {
        TargetField::ALL
            .iter()
            .map(|&field| FieldCandidate::unresolved(field))
            .collect()
    }
}
